//! JSON view of a parsed package.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use osz2_archive::{MetaType, Package};
use serde::Serialize;

#[derive(Serialize)]
pub struct PackageReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beatmap_set_id: Option<String>,

    /// Every metadata entry, keyed by tag name.
    pub attributes: BTreeMap<String, String>,

    /// Entries whose tag code is not part of the known set, keyed by the
    /// raw code.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub unknown_attributes: BTreeMap<i16, String>,

    pub files: Vec<FileReport>,
    pub hashes: HashReport,
}

#[derive(Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub size: i32,
    pub hash: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beatmap_id: Option<i32>,
}

#[derive(Serialize)]
pub struct HashReport {
    pub metadata_hash: String,
    pub file_info_hash: String,
    pub full_body_hash: String,
}

impl PackageReport {
    pub fn new(package: &Package) -> Self {
        let value = |tag: MetaType| package.metadata_value(tag).map(str::to_owned);

        let attributes = package
            .metadata()
            .iter()
            .map(|(tag, v)| (tag.to_string(), v.clone()))
            .collect();

        let unknown_attributes = package
            .unknown_metadata()
            .iter()
            .map(|(code, v)| (*code, v.clone()))
            .collect();

        let mut files: Vec<FileReport> = package
            .file_infos()
            .values()
            .map(|info| FileReport {
                file_name: info.file_name.clone(),
                size: info.size,
                hash: hex(&info.hash),
                date_created: info.date_created,
                date_modified: info.date_modified,
                beatmap_id: package.file_names().get(&info.file_name).copied(),
            })
            .collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        Self {
            title: value(MetaType::Title),
            artist: value(MetaType::Artist),
            creator: value(MetaType::Creator),
            version: value(MetaType::Version),
            beatmap_set_id: value(MetaType::BeatmapSetID),
            attributes,
            unknown_attributes,
            files,
            hashes: HashReport {
                metadata_hash: hex(package.metadata_hash()),
                file_info_hash: hex(package.file_info_hash()),
                full_body_hash: hex(package.full_body_hash()),
            },
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
