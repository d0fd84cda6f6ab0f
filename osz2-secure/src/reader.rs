//! Streaming XXTEA decryption.

use std::io::{self, Read};

use crate::xxtea::Xxtea;

/// Decrypts whatever the inner reader returns, one read at a time.
///
/// Every read is decrypted independently with a block width derived from its
/// own length, so the caller must consume the stream with the same chunk
/// sizes the producer encrypted with. The package parser reads its file-info
/// table field by field, which is exactly how the table was written.
pub struct XxteaReader<R> {
    inner: R,
    xxtea: Xxtea,
}

impl<R: Read> XxteaReader<R> {
    pub fn new(inner: R, key: &[u8; 16]) -> Self {
        Self {
            inner,
            xxtea: Xxtea::new(key),
        }
    }
}

impl<R: Read> Read for XxteaReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.xxtea.decrypt(&mut buf[..n]);
        Ok(n)
    }
}
