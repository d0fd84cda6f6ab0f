//! Cipher stack and hash protocol used by `.osz2` packages.
//!
//! The format layers three ciphers over one 16-byte key: a byte-at-a-time
//! scrambler ([`simple::SimpleCryptor`]) for tails that do not fill a cipher
//! block, XTEA ([`xtea::Xtea`]) for 8-byte blocks, and Corrected Block TEA
//! ([`xxtea::Xxtea`]) for 64-byte blocks and word-sized tails. The keyed
//! positional hash the format verifies its regions with lives in [`hash`].

pub mod hash;
pub mod reader;
pub mod simple;
pub mod xtea;
pub mod xxtea;

/// Shared delta constant of the TEA cipher family.
pub const TEA_DELTA: u32 = 0x9E37_79B9;

pub use reader::XxteaReader;
pub use simple::SimpleCryptor;
pub use xtea::Xtea;
pub use xxtea::Xxtea;

#[cfg(test)]
mod tests;

/// Unpack a 16-byte key into the four little-endian words the TEA ciphers
/// operate on.
pub(crate) fn key_words(key: &[u8; 16]) -> [u32; 4] {
    use byteorder::{ByteOrder, LE};

    [
        LE::read_u32(&key[0..4]),
        LE::read_u32(&key[4..8]),
        LE::read_u32(&key[8..12]),
        LE::read_u32(&key[12..16]),
    ]
}
