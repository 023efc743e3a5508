use super::*;

#[test]
fn all_black_packs_to_zero_bytes() {
    assert_eq!(pack_monochrome_vec(&[0u8; 16]), vec![0u8, 0u8]);
}

#[test]
fn all_white_packs_to_full_byte() {
    assert_eq!(pack_monochrome_vec(&[255u8; 8]), vec![0xFF]);
}

#[test]
fn threshold_uses_two_high_bits() {
    assert!(!is_lit(0x3F));
    assert!(is_lit(0x40));
    assert!(is_lit(0x80));
    assert!(is_lit(192));
    assert!(!is_lit(0));
}

#[test]
fn bit_order_is_msb_first() {
    let src = [255u8, 0, 0, 0, 0, 0, 0, 0x40];
    assert_eq!(pack_monochrome_vec(&src), vec![0b1000_0001]);
}

#[test]
fn partial_byte_pads_low_bits_with_zero() {
    let src = [255u8; 3];
    assert_eq!(pack_monochrome_vec(&src), vec![0b1110_0000]);

    let src = [0u8, 255, 0, 0, 0, 0, 0, 0, 255, 255];
    assert_eq!(pack_monochrome_vec(&src), vec![0b0100_0000, 0b1100_0000]);
}

#[test]
fn empty_input_packs_to_nothing() {
    assert!(pack_monochrome_vec(&[]).is_empty());
}

#[test]
fn packed_length_and_bits_match_samples() {
    // Deterministic pseudo-random sweep across lengths that are and are not multiples of 8.
    let mut state = 0x2545_f491_u32;
    for n in 0..70usize {
        let src: Vec<u8> = (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            })
            .collect();

        let packed = pack_monochrome_vec(&src);
        assert_eq!(packed.len(), n.div_ceil(8));
        for (i, &s) in src.iter().enumerate() {
            assert_eq!(packed_bit(&packed, i), s & 0xC0 != 0, "n={n} i={i}");
        }
        if n % 8 != 0 {
            let last = *packed.last().unwrap();
            let unused = 8 - n % 8;
            assert_eq!(last & ((1u8 << unused) - 1), 0);
        }
    }
}

#[test]
#[should_panic(expected = "packed row length")]
fn wrong_destination_length_panics() {
    let mut dst = [0u8; 2];
    pack_monochrome(&[0u8; 8], &mut dst);
}
