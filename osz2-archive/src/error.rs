//! Error types for package parsing.

use std::io;

use thiserror::Error;

/// Everything that can abort a package parse.
///
/// Any failure up to and including the file-info table aborts the parse with
/// one of these; only per-file extraction degrades to a warning.
#[derive(Debug, Error)]
pub enum Osz2Error {
    #[error("file is not a valid .osz2 package")]
    InvalidMagic,
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("7-bit encoded length is malformed")]
    BadVarint,
    #[error("metadata hash mismatch")]
    MetadataHashMismatch,
    #[error("file info hash mismatch")]
    FileInfoHashMismatch,
    #[error("missing required metadata for key derivation")]
    MissingRequiredMetadata,
    #[error("file info region has invalid length {0}")]
    InvalidFileInfoLength(i32),
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Osz2Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(err)
        }
    }
}

impl From<binrw::Error> for Osz2Error {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(inner) => inner.into(),
            other => Self::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}
