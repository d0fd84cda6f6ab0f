//! Random-access decrypting stream over one file's payload.

use std::io::{self, Read, Seek, SeekFrom};

use osz2_secure::Xxtea;

use crate::error::Osz2Error;

const WINDOW: u64 = 64;

/// Streams the decrypted contents of a single packaged file.
///
/// The payload begins with a 4-byte XXTEA-encrypted plaintext length; the
/// bytes after it are XXTEA ciphertext in independent 64-byte blocks, so any
/// byte range can be served by decrypting only the windows that cover it.
/// The final window may be shorter than 64 bytes and is decrypted with its
/// true length.
pub struct ContentReader<R> {
    inner: R,

    /// Source offset of the first ciphertext byte (just past the length
    /// prefix).
    base: u64,

    /// Plaintext length of the stream.
    length: u64,

    /// Current logical position in the plaintext.
    position: u64,

    window: [u8; WINDOW as usize],
    xxtea: Xxtea,
}

impl<R: Read + Seek> ContentReader<R> {
    /// Open the payload at `offset` and decode its length prefix.
    pub fn new(mut inner: R, offset: u64, key: &[u8; 16]) -> Result<Self, Osz2Error> {
        let xxtea = Xxtea::new(key);

        let mut encrypted_length = [0u8; 4];
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(&mut encrypted_length)?;
        xxtea.decrypt(&mut encrypted_length);

        Ok(Self {
            inner,
            base: offset + 4,
            length: u64::from(u32::from_le_bytes(encrypted_length)),
            position: 0,
            window: [0u8; WINDOW as usize],
            xxtea,
        })
    }

    /// Plaintext length of the stream.
    pub const fn len(&self) -> u64 {
        self.length
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<R: Read + Seek> Read for ContentReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.length.saturating_sub(self.position);
        let count = (buf.len() as u64).min(remaining);
        if count == 0 {
            return Ok(0);
        }

        let end = self.position + count;
        let mut window_start = self.position & !(WINDOW - 1);
        let mut written = 0usize;

        while window_start < end {
            let window_len = WINDOW.min(self.length - window_start) as usize;
            let copy_from = self.position.max(window_start);
            let copy_to = end.min(window_start + window_len as u64);

            if copy_from == window_start && copy_to == window_start + WINDOW {
                // Fully covered window: decrypt straight into the caller's
                // buffer.
                let dst = &mut buf[written..written + WINDOW as usize];
                self.inner.seek(SeekFrom::Start(self.base + window_start))?;
                self.inner.read_exact(dst)?;
                self.xxtea.decrypt(dst);
            } else {
                let scratch = &mut self.window[..window_len];
                self.inner.seek(SeekFrom::Start(self.base + window_start))?;
                self.inner.read_exact(scratch)?;
                self.xxtea.decrypt(scratch);

                let lo = (copy_from - window_start) as usize;
                let hi = (copy_to - window_start) as usize;
                buf[written..written + hi - lo].copy_from_slice(&scratch[lo..hi]);
            }

            written += (copy_to - copy_from) as usize;
            window_start += WINDOW;
        }

        self.position = end;
        Ok(count as usize)
    }
}

impl<R: Read + Seek> Seek for ContentReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.length) + i128::from(offset),
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ));
        }

        self.position = target.min(i128::from(u64::MAX)) as u64;
        Ok(self.position)
    }
}
