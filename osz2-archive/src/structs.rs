use binrw::BinRead;
use chrono::{DateTime, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};

/// The three bytes every package starts with.
pub const PACKAGE_MAGIC: [u8; 3] = [0xEC, 0x48, 0x4F];

/// Fixed header record following the magic bytes.
///
/// The version byte and IV are carried by the format but unused; the three
/// digests verify the metadata region, the encrypted file-info region, and
/// the package body.
#[derive(BinRead, Debug, Clone)]
#[br(little)]
pub struct PackageHeader {
    pub version: u8,
    pub iv: [u8; 16],
    pub metadata_hash: [u8; 16],
    pub file_info_hash: [u8; 16],
    pub full_body_hash: [u8; 16],
}

/// Metadata tag codes carried by the package.
///
/// Codes outside the known set collapse to [`MetaType::Unknown`]; the parser
/// keeps their raw identity in a secondary map on [`crate::Package`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive,
)]
#[repr(i16)]
pub enum MetaType {
    Title = 0,
    Artist = 1,
    Creator = 2,
    Version = 3,
    Source = 4,
    Tags = 5,
    VideoDataOffset = 6,
    VideoDataLength = 7,
    VideoHash = 8,
    BeatmapSetID = 9,
    Genre = 10,
    Language = 11,
    TitleUnicode = 12,
    ArtistUnicode = 13,
    Difficulty = 14,
    PreviewTime = 15,
    ArtistFullName = 16,
    ArtistTwitter = 17,
    SourceUnicode = 18,
    ArtistURL = 19,
    Revision = 20,
    PackID = 21,
    #[num_enum(default)]
    Unknown = 9999,
}

impl core::fmt::Display for MetaType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Title => "Title",
            Self::Artist => "Artist",
            Self::Creator => "Creator",
            Self::Version => "Version",
            Self::Source => "Source",
            Self::Tags => "Tags",
            Self::VideoDataOffset => "VideoDataOffset",
            Self::VideoDataLength => "VideoDataLength",
            Self::VideoHash => "VideoHash",
            Self::BeatmapSetID => "BeatmapSetID",
            Self::Genre => "Genre",
            Self::Language => "Language",
            Self::TitleUnicode => "TitleUnicode",
            Self::ArtistUnicode => "ArtistUnicode",
            Self::Difficulty => "Difficulty",
            Self::PreviewTime => "PreviewTime",
            Self::ArtistFullName => "ArtistFullName",
            Self::ArtistTwitter => "ArtistTwitter",
            Self::SourceUnicode => "SourceUnicode",
            Self::ArtistURL => "ArtistURL",
            Self::Revision => "Revision",
            Self::PackID => "PackID",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Descriptor for one file in the package.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub file_name: String,

    /// Position of the file's encrypted bytes relative to the package's
    /// file-data base offset.
    pub offset: i32,

    /// Length of the encrypted region, including the 4-byte encrypted length
    /// prefix. The plaintext is `size - 4` bytes.
    pub size: i32,

    pub hash: [u8; 16],
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_type_from_raw_code() {
        assert_eq!(MetaType::from(2i16), MetaType::Creator);
        assert_eq!(MetaType::from(9i16), MetaType::BeatmapSetID);
        assert_eq!(MetaType::from(21i16), MetaType::PackID);
        assert_eq!(MetaType::from(500i16), MetaType::Unknown);
        assert_eq!(MetaType::from(-1i16), MetaType::Unknown);
    }

    #[test]
    fn meta_type_display_names() {
        assert_eq!(MetaType::BeatmapSetID.to_string(), "BeatmapSetID");
        assert_eq!(MetaType::from(1234i16).to_string(), "Unknown");
    }
}
