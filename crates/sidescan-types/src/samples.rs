//! Raw sonar sample decoding and requantization to the indexed width.

use std::borrow::Cow;

use sidescan_error::{Result, SidescanError};

/// Sample width of the indexed blob.
pub const INDEXED_BITS_PER_POINT: u32 = 8;

/// Decode little-endian unsigned samples of `bits_per_point` bits and
/// multiply each by `scale_factor`.
///
/// Widths of 8, 16, 24, ... 64 bits are accepted. A trailing partial sample
/// is dropped.
pub fn decode_samples(bytes: &[u8], bits_per_point: u32, scale_factor: f64) -> Result<Vec<f64>> {
    let width = sample_width(bits_per_point)?;
    Ok(bytes
        .chunks_exact(width)
        .map(|chunk| {
            let raw = chunk
                .iter()
                .rev()
                .fold(0_u64, |acc, &byte| (acc << 8) | u64::from(byte));
            raw as f64 * scale_factor
        })
        .collect())
}

/// Decode and map raw samples onto `[0, 1]` by the full scale of their width.
pub fn normalized_samples(bytes: &[u8], bits_per_point: u32) -> Result<Vec<f64>> {
    sample_width(bits_per_point)?;
    let full_scale = full_scale(bits_per_point);
    Ok(decode_samples(bytes, bits_per_point, 1.0)?
        .into_iter()
        .map(|value| value / full_scale)
        .collect())
}

/// Requantize samples of `bits_per_point` bits to the 8-bit indexed width,
/// rounding against full scale. 8-bit payloads are borrowed as is.
pub fn to_indexed_samples(bytes: &[u8], bits_per_point: u32) -> Result<Cow<'_, [u8]>> {
    if bits_per_point == INDEXED_BITS_PER_POINT {
        return Ok(Cow::Borrowed(bytes));
    }
    let indexed_full_scale = full_scale(INDEXED_BITS_PER_POINT);
    Ok(Cow::Owned(
        normalized_samples(bytes, bits_per_point)?
            .into_iter()
            .map(|value| (value * indexed_full_scale).round() as u8)
            .collect(),
    ))
}

fn full_scale(bits_per_point: u32) -> f64 {
    if bits_per_point == 64 {
        u64::MAX as f64
    } else {
        ((1_u64 << bits_per_point) - 1) as f64
    }
}

fn sample_width(bits_per_point: u32) -> Result<usize> {
    if bits_per_point < 8 || bits_per_point > 64 || bits_per_point % 8 != 0 {
        return Err(SidescanError::OutOfRange {
            what: "bits per sample".to_owned(),
            value: bits_per_point.to_string(),
        });
    }
    Ok((bits_per_point / 8) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_bit_samples() {
        let decoded = decode_samples(&[0, 1, 255], 8, 1.0).expect("decode");
        assert_eq!(decoded, vec![0.0, 1.0, 255.0]);
    }

    #[test]
    fn test_multi_byte_samples_are_little_endian() {
        let decoded = decode_samples(&[0x34, 0x12, 0xFF, 0xFF], 16, 1.0).expect("decode");
        assert_eq!(decoded, vec![f64::from(0x1234_u16), 65_535.0]);

        let decoded = decode_samples(&[1, 0, 0, 0, 7], 32, 0.5).expect("decode");
        assert_eq!(decoded, vec![0.5]);
    }

    #[test]
    fn test_sixty_four_bit_samples_are_unsigned() {
        let decoded = decode_samples(&[0xFF; 8], 64, 1.0).expect("decode");
        assert_eq!(decoded, vec![u64::MAX as f64]);
    }

    #[test]
    fn test_unsupported_widths() {
        for bits in [0, 4, 12, 72] {
            assert!(decode_samples(&[0; 16], bits, 1.0).is_err(), "bits={bits}");
        }
    }

    #[test]
    fn test_normalized_samples() {
        let eight = normalized_samples(&[0, 255], 8).expect("decode");
        assert_eq!(eight, vec![0.0, 1.0]);
        let sixteen = normalized_samples(&[0xFF, 0xFF, 0x00, 0x00], 16).expect("decode");
        assert_eq!(sixteen, vec![1.0, 0.0]);
    }

    #[test]
    fn test_wide_samples_are_requantized_to_eight_bits() {
        let indexed =
            to_indexed_samples(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x80, 0x01], 16).expect("requantize");
        // 0x8000 / 0xFFFF lands just above half scale; the odd trailing byte is dropped.
        assert_eq!(indexed.as_ref(), &[255, 0, 128]);
        assert!(matches!(indexed, Cow::Owned(_)));

        let wide = to_indexed_samples(&[0, 0, 0, 0x80], 32).expect("requantize");
        assert_eq!(wide.as_ref(), &[128]);
    }

    #[test]
    fn test_eight_bit_samples_are_borrowed() {
        let bytes = [3, 1, 4];
        let indexed = to_indexed_samples(&bytes, 8).expect("requantize");
        assert!(matches!(indexed, Cow::Borrowed(b) if b == bytes));
        assert!(to_indexed_samples(&bytes, 12).is_err());
    }
}
