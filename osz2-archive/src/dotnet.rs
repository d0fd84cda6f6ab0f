//! .NET binary serialization primitives the format inherits: 7-bit encoded
//! lengths, length-prefixed strings, and `DateTime.ToBinary()` instants.

use std::io::Read;

use chrono::{DateTime, Utc};

use crate::error::Osz2Error;

/// Ticks between 0001-01-01 and the Unix epoch, in 100 ns units.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Low 62 bits of a `DateTime.ToBinary()` value carry the ticks; the top two
/// bits encode the kind and are discarded.
const TICKS_MASK: i64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Read a 7-bit encoded length: LSB-first groups of seven bits, high bit set
/// meaning "more". Errors with [`Osz2Error::BadVarint`] once the shift
/// reaches 32 (five bytes).
pub fn read_7bit_len<R: Read>(r: &mut R) -> Result<usize, Osz2Error> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;

        result |= u32::from(byte[0] & 0x7F) << shift;
        if byte[0] & 0x80 == 0 {
            break;
        }

        shift += 7;
        if shift >= 32 {
            return Err(Osz2Error::BadVarint);
        }
    }

    Ok(result as usize)
}

/// Read a length-prefixed UTF-8 string. Invalid UTF-8 is replaced rather
/// than failing the parse.
pub fn read_string<R: Read>(r: &mut R) -> Result<String, Osz2Error> {
    let len = read_7bit_len(r)?;
    if len == 0 {
        return Ok(String::new());
    }

    let mut data = vec![0u8; len];
    r.read_exact(&mut data)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Append a 7-bit encoded length to `out`.
pub fn write_7bit_len(out: &mut Vec<u8>, mut value: usize) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Append a length-prefixed string to `out`.
pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_7bit_len(out, value.len());
    out.extend_from_slice(value.as_bytes());
}

/// Decode a `DateTime.ToBinary()` value to a UTC instant.
pub fn datetime_from_binary(raw: i64) -> DateTime<Utc> {
    let ticks = raw & TICKS_MASK;
    let offset = ticks - UNIX_EPOCH_TICKS;

    let secs = offset.div_euclid(TICKS_PER_SECOND);
    let nanos = (offset.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn varint_single_byte() {
        assert_eq!(read_7bit_len(&mut Cursor::new([0x00])).unwrap(), 0);
        assert_eq!(read_7bit_len(&mut Cursor::new([0x7F])).unwrap(), 127);
    }

    #[test]
    fn varint_multi_byte() {
        assert_eq!(read_7bit_len(&mut Cursor::new([0x80, 0x01])).unwrap(), 128);
        assert_eq!(
            read_7bit_len(&mut Cursor::new([0xE5, 0x8E, 0x26])).unwrap(),
            624_485
        );
    }

    #[test]
    fn varint_rejects_overlong_encoding() {
        let result = read_7bit_len(&mut Cursor::new([0x80, 0x80, 0x80, 0x80, 0x80, 0x01]));
        assert!(matches!(result, Err(Osz2Error::BadVarint)));
    }

    #[test]
    fn varint_truncation_is_eof() {
        let result = read_7bit_len(&mut Cursor::new([0x80]));
        assert!(matches!(result, Err(Osz2Error::UnexpectedEof)));
    }

    #[test]
    fn varint_roundtrip() {
        for value in [0usize, 1, 127, 128, 300, 16_383, 16_384, 1_000_000] {
            let mut encoded = Vec::new();
            write_7bit_len(&mut encoded, value);
            assert_eq!(
                read_7bit_len(&mut Cursor::new(&encoded)).unwrap(),
                value,
                "roundtrip failed for {value}"
            );
        }
    }

    #[test]
    fn string_roundtrip() {
        let mut encoded = Vec::new();
        write_string(&mut encoded, "audio.mp3");
        assert_eq!(read_string(&mut Cursor::new(&encoded)).unwrap(), "audio.mp3");

        let mut empty = Vec::new();
        write_string(&mut empty, "");
        assert_eq!(read_string(&mut Cursor::new(&empty)).unwrap(), "");
    }

    #[test]
    fn datetime_reference_vector() {
        // Little-endian bytes 00 00 62 20 8A E4 A7 08.
        let raw = 0x08A7_E48A_2062_0000_i64;
        let expected = DateTime::from_timestamp(236_238_731, 401_625_600).unwrap();
        assert_eq!(datetime_from_binary(raw), expected);
    }

    #[test]
    fn datetime_kind_bits_are_ignored() {
        let raw = 0x08A7_E48A_2062_0000_i64;
        let with_kind = raw | (1 << 62);
        assert_eq!(datetime_from_binary(raw), datetime_from_binary(with_kind));
    }

    #[test]
    fn datetime_unix_epoch() {
        assert_eq!(
            datetime_from_binary(UNIX_EPOCH_TICKS),
            DateTime::from_timestamp(0, 0).unwrap()
        );
    }
}
