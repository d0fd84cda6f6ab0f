//! The keyed positional hash the package format verifies its regions with.

/// Raw MD5 digest of `data`.
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    md5::compute(data).0
}

/// Hash a region the way the format does.
///
/// A copy of `buffer` has the byte at `pos` XORed with `swap` (skipped when
/// `pos` falls outside the buffer), is MD5-hashed, and the digest is then
/// permuted: the two 8-byte halves trade places and byte 5 is XORed with
/// `0x2D`.
pub fn osz_hash(buffer: &[u8], pos: usize, swap: u8) -> [u8; 16] {
    let mut scratch = buffer.to_vec();
    if pos < scratch.len() {
        scratch[pos] ^= swap;
    }

    let mut digest = md5_digest(&scratch);
    for i in 0..8 {
        digest.swap(i, i + 8);
    }
    digest[5] ^= 0x2D;
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_matches_reference_vector() {
        // MD5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(
            md5_digest(b"abc"),
            [
                0x90, 0x01, 0x50, 0x98, 0x3C, 0xD2, 0x4F, 0xB0, 0xD6, 0x96, 0x3F, 0x7D, 0x28,
                0xE1, 0x7F, 0x72,
            ]
        );
    }
}
