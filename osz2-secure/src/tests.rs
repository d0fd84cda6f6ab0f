use std::io::Read;

use crate::hash::osz_hash;
use crate::reader::XxteaReader;
use crate::simple::SimpleCryptor;
use crate::xtea::Xtea;
use crate::xxtea::Xxtea;

const TEST_KEY: [u8; 16] = [
    0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32,
    0x10,
];

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn simple_cryptor_roundtrip_across_lengths() {
    let cryptor = SimpleCryptor::new(TEST_KEY);

    for len in [0, 1, 2, 3, 7, 15, 16, 17, 63, 64, 65, 255, 1024] {
        let original = pattern(len);
        let mut buf = original.clone();

        cryptor.encrypt(&mut buf);
        if len > 2 {
            assert_ne!(buf, original, "encryption left {len} bytes untouched");
        }
        cryptor.decrypt(&mut buf);
        assert_eq!(buf, original, "roundtrip failed for {len} bytes");
    }
}

#[test]
fn simple_cryptor_state_resets_per_call() {
    let cryptor = SimpleCryptor::new(TEST_KEY);

    let mut first = pattern(32);
    let mut second = pattern(32);
    cryptor.encrypt(&mut first);
    cryptor.encrypt(&mut second);

    // Same key, same plaintext, fresh state: identical ciphertext.
    assert_eq!(first, second);
}

#[test]
fn xtea_block_roundtrip() {
    let cipher = Xtea::new(&TEST_KEY);

    let original = pattern(64);
    let mut buf = original.clone();
    cipher.encrypt(&mut buf);
    assert_ne!(buf, original);
    cipher.decrypt(&mut buf);
    assert_eq!(buf, original);
}

#[test]
fn xtea_roundtrip_with_byte_tail() {
    let cipher = Xtea::new(&TEST_KEY);

    // 70 = 8 full blocks + 6 tail bytes through the scrambler.
    let original = pattern(70);
    let mut buf = original.clone();
    cipher.encrypt(&mut buf);
    cipher.decrypt(&mut buf);
    assert_eq!(buf, original);
}

#[test]
fn xtea_blocks_are_independent() {
    let cipher = Xtea::new(&TEST_KEY);

    let original = pattern(16);
    let mut both = original.clone();
    cipher.encrypt(&mut both);

    let mut first = original[..8].to_vec();
    cipher.encrypt(&mut first);
    assert_eq!(&both[..8], &first[..]);
}

#[test]
fn xxtea_roundtrip_word_counts() {
    let cipher = Xxtea::new(&TEST_KEY);

    for words in 2..=16 {
        let original = pattern(words * 4);
        let mut buf = original.clone();
        cipher.encrypt(&mut buf);
        assert_ne!(buf, original, "{words} words unchanged by encryption");
        cipher.decrypt(&mut buf);
        assert_eq!(buf, original, "{words}-word roundtrip failed");
    }
}

#[test]
fn xxtea_roundtrip_mixed_tails() {
    let cipher = Xxtea::new(&TEST_KEY);

    // Full blocks plus a word tail, a single-word tail, and byte tails.
    for len in [65, 68, 71, 129, 193, 199, 200, 1000] {
        let original = pattern(len);
        let mut buf = original.clone();
        cipher.encrypt(&mut buf);
        cipher.decrypt(&mut buf);
        assert_eq!(buf, original, "roundtrip failed for {len} bytes");
    }
}

#[test]
fn xxtea_full_blocks_are_independent() {
    let cipher = Xxtea::new(&TEST_KEY);

    let original = pattern(128);
    let mut whole = original.clone();
    cipher.encrypt(&mut whole);

    // Decrypting just the first 64-byte block recovers the first 64 bytes;
    // the random-access content reader depends on this.
    let mut head = whole[..64].to_vec();
    cipher.decrypt(&mut head);
    assert_eq!(&head[..], &original[..64]);
}

#[test]
fn xxtea_reader_reverses_chunked_encryption() {
    let cipher = Xxtea::new(&TEST_KEY);
    let original = pattern(33);
    let chunks = [4usize, 4, 1, 8, 16];

    let mut encrypted = original.clone();
    let mut at = 0;
    for len in chunks {
        cipher.encrypt(&mut encrypted[at..at + len]);
        at += len;
    }

    let mut reader = XxteaReader::new(&encrypted[..], &TEST_KEY);
    let mut decrypted = Vec::new();
    for len in chunks {
        let mut piece = vec![0u8; len];
        reader.read_exact(&mut piece).unwrap();
        decrypted.extend_from_slice(&piece);
    }

    assert_eq!(decrypted, original);
}

#[test]
fn osz_hash_out_of_range_position_vector() {
    // MD5("abc") with swapped halves and byte 5 XORed with 0x2D.
    let digest = osz_hash(b"abc", 10, 0xA7);
    assert_eq!(
        digest,
        [
            0xD6, 0x96, 0x3F, 0x7D, 0x28, 0xCC, 0x7F, 0x72, 0x90, 0x01, 0x50, 0x98, 0x3C, 0xD2,
            0x4F, 0xB0,
        ]
    );
}

#[test]
fn osz_hash_in_range_position_vector() {
    let digest = osz_hash(b"The quick brown fox", 4, 0xA7);
    assert_eq!(
        digest,
        [
            0xB7, 0xAE, 0x14, 0xF5, 0x35, 0xAE, 0x16, 0x24, 0x3E, 0x00, 0x5C, 0x9C, 0xD9, 0x61,
            0x9B, 0x43,
        ]
    );
}

#[test]
fn osz_hash_is_position_and_swap_sensitive() {
    let buf = pattern(48);

    let base = osz_hash(&buf, 3, 0xA7);
    assert_eq!(base, osz_hash(&buf, 3, 0xA7));
    assert_ne!(base, osz_hash(&buf, 4, 0xA7));
    assert_ne!(base, osz_hash(&buf, 3, 0xD1));
}

#[test]
fn osz_hash_leaves_input_untouched() {
    let buf = pattern(16);
    let copy = buf.clone();
    let _ = osz_hash(&buf, 0, 0xFF);
    assert_eq!(buf, copy);
}
