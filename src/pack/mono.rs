/// Intensity mask deciding whether a gray sample counts as lit.
///
/// A sample is lit when either of its two highest bits is set, i.e. from 64 upwards.
pub const MONO_MASK: u8 = 0xC0;

/// True when `sample` packs to a set bit.
#[inline]
pub fn is_lit(sample: u8) -> bool {
    sample & MONO_MASK != 0
}

/// Number of packed bytes needed for `samples` gray pixels.
#[inline]
pub fn packed_len(samples: usize) -> usize {
    samples.div_ceil(8)
}

/// Pack gray samples into 1-bit-per-pixel bytes, most significant bit first.
///
/// `dst` must hold exactly `packed_len(src.len())` bytes. Unused low bits of a trailing
/// partial byte are zero.
pub fn pack_monochrome(src: &[u8], dst: &mut [u8]) {
    assert_eq!(
        dst.len(),
        packed_len(src.len()),
        "packed row length does not match sample count"
    );

    for (out, chunk) in dst.iter_mut().zip(src.chunks(8)) {
        let mut packed = 0u8;
        for (bit, &sample) in chunk.iter().enumerate() {
            if is_lit(sample) {
                packed |= 0x80 >> bit;
            }
        }
        *out = packed;
    }
}

/// Allocating convenience over [`pack_monochrome`].
pub fn pack_monochrome_vec(src: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; packed_len(src.len())];
    pack_monochrome(src, &mut out);
    out
}

/// Read pixel `x` back out of a packed row.
#[inline]
pub fn packed_bit(row: &[u8], x: usize) -> bool {
    row[x / 8] & (0x80 >> (x % 8)) != 0
}

#[cfg(test)]
#[path = "../../tests/unit/pack/mono.rs"]
mod tests;
