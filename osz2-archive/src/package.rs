//! The package parser: header validation, hash verification, key derivation,
//! file-table decryption and file extraction.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::BinReaderExt;
use byteorder::{LittleEndian, ReadBytesExt};
use osz2_secure::hash::{md5_digest, osz_hash};
use osz2_secure::{Xtea, XxteaReader};
use tracing::warn;

use crate::content::ContentReader;
use crate::dotnet;
use crate::error::Osz2Error;
use crate::structs::{FileInfo, MetaType, PackageHeader, PACKAGE_MAGIC};

/// Infix concatenated between creator and beatmap set id when deriving the
/// package key.
const KEY_SEED_INFIX: &str = "yhxyfjo5";

/// A fully parsed package.
///
/// Produced atomically by [`Package::from_reader`]; read-only afterwards.
pub struct Package {
    metadata: HashMap<MetaType, String>,
    unknown_metadata: HashMap<i16, String>,
    file_names: HashMap<String, i32>,
    file_ids: HashMap<i32, String>,
    file_infos: HashMap<String, FileInfo>,
    files: HashMap<String, Vec<u8>>,
    metadata_hash: [u8; 16],
    file_info_hash: [u8; 16],
    full_body_hash: [u8; 16],
    key: [u8; 16],
}

impl Package {
    /// Parse a package from a seekable byte source.
    ///
    /// With `metadata_only` the parse stops after the filename map and key
    /// derivation: file descriptors and contents stay empty. Otherwise the
    /// file table is decrypted and verified, and every file's contents are
    /// materialized. A file that fails to decrypt is logged and omitted; any
    /// earlier failure aborts the parse.
    pub fn from_reader<R: Read + Seek>(mut reader: R, metadata_only: bool) -> Result<Self, Osz2Error> {
        // 1. Magic
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic)?;
        if magic != PACKAGE_MAGIC {
            return Err(Osz2Error::InvalidMagic);
        }

        // 2. Fixed header: version byte and IV (both unused) plus the three
        //    region digests.
        let header: PackageHeader = reader.read_le()?;

        // 3. Plaintext metadata, verified against its on-wire bytes.
        let (metadata, unknown_metadata) = read_metadata(&mut reader, &header.metadata_hash)?;

        // 4. Plaintext filename map.
        let (file_names, file_ids) = read_file_names(&mut reader)?;

        // 5. Key derivation.
        let creator = metadata
            .get(&MetaType::Creator)
            .ok_or(Osz2Error::MissingRequiredMetadata)?;
        let set_id = metadata
            .get(&MetaType::BeatmapSetID)
            .ok_or(Osz2Error::MissingRequiredMetadata)?;
        let key = md5_digest(format!("{creator}{KEY_SEED_INFIX}{set_id}").as_bytes());

        let mut package = Self {
            metadata,
            unknown_metadata,
            file_names,
            file_ids,
            file_infos: HashMap::new(),
            files: HashMap::new(),
            metadata_hash: header.metadata_hash,
            file_info_hash: header.file_info_hash,
            full_body_hash: header.full_body_hash,
            key,
        };

        if !metadata_only {
            package.read_files(&mut reader)?;
        }

        Ok(package)
    }

    /// Metadata keyed by tag. Unknown tags collapse to [`MetaType::Unknown`]
    /// here; see [`Package::unknown_metadata`] for their raw identities.
    pub fn metadata(&self) -> &HashMap<MetaType, String> {
        &self.metadata
    }

    /// Value for a single metadata tag.
    pub fn metadata_value(&self, tag: MetaType) -> Option<&str> {
        self.metadata.get(&tag).map(String::as_str)
    }

    /// Entries whose tag code is not part of the known enumeration, keyed by
    /// the raw 16-bit code.
    pub fn unknown_metadata(&self) -> &HashMap<i16, String> {
        &self.unknown_metadata
    }

    /// Filename to beatmap id mapping.
    pub fn file_names(&self) -> &HashMap<String, i32> {
        &self.file_names
    }

    /// Beatmap id to filename mapping; inverse of [`Package::file_names`].
    pub fn file_ids(&self) -> &HashMap<i32, String> {
        &self.file_ids
    }

    /// Per-file descriptors. Empty after a metadata-only parse.
    pub fn file_infos(&self) -> &HashMap<String, FileInfo> {
        &self.file_infos
    }

    /// Decrypted file contents. Empty after a metadata-only parse.
    pub fn files(&self) -> &HashMap<String, Vec<u8>> {
        &self.files
    }

    pub const fn metadata_hash(&self) -> &[u8; 16] {
        &self.metadata_hash
    }

    pub const fn file_info_hash(&self) -> &[u8; 16] {
        &self.file_info_hash
    }

    pub const fn full_body_hash(&self) -> &[u8; 16] {
        &self.full_body_hash
    }

    /// The key derived from the package metadata, kept for later extraction.
    pub const fn key(&self) -> &[u8; 16] {
        &self.key
    }

    fn read_files<R: Read + Seek>(&mut self, reader: &mut R) -> Result<(), Osz2Error> {
        // A 64-byte XTEA block precedes the file table. Its plaintext is
        // never inspected; decrypting it consumes the bytes and keeps the
        // stream aligned.
        let xtea = Xtea::new(&self.key);
        let mut magic_block = [0u8; 64];
        reader.read_exact(&mut magic_block)?;
        xtea.decrypt(&mut magic_block);

        // The file-table length is obfuscated with values drawn from the
        // table's own digest.
        let mut length = reader.read_i32::<LittleEndian>()?;
        for i in (0..16).step_by(2) {
            let fudge =
                i32::from(self.file_info_hash[i]) | (i32::from(self.file_info_hash[i + 1]) << 17);
            length = length.wrapping_sub(fudge);
        }
        if length <= 0 {
            return Err(Osz2Error::InvalidFileInfoLength(length));
        }

        let mut file_info_raw = vec![0u8; length as usize];
        reader.read_exact(&mut file_info_raw)?;

        // Everything after the table is file data; entry offsets are
        // relative to this point.
        let data_base = reader.stream_position()?;
        let total_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(data_base))?;

        self.parse_file_info(&file_info_raw, data_base, total_size)?;
        self.read_file_contents(reader, data_base);
        Ok(())
    }

    fn parse_file_info(
        &mut self,
        encrypted: &[u8],
        data_base: u64,
        total_size: u64,
    ) -> Result<(), Osz2Error> {
        // The table decrypts through a streaming reader; reads below follow
        // the exact field sizes the producer encrypted with.
        let mut reader = XxteaReader::new(Cursor::new(encrypted), &self.key);
        let count = reader.read_i32::<LittleEndian>()?;

        // The digest covers the encrypted bytes, with the swap position
        // derived from the entry count.
        let digest = osz_hash(encrypted, (count as usize).wrapping_mul(4), 0xD1);
        if digest != self.file_info_hash {
            return Err(Osz2Error::FileInfoHashMismatch);
        }

        let mut current_offset = reader.read_i32::<LittleEndian>()?;
        for i in 0..count {
            let file_name = dotnet::read_string(&mut reader)?;

            let mut hash = [0u8; 16];
            reader.read_exact(&mut hash)?;

            let date_created = dotnet::datetime_from_binary(reader.read_i64::<LittleEndian>()?);
            let date_modified = dotnet::datetime_from_binary(reader.read_i64::<LittleEndian>()?);

            // Entry sizes are implicit: each entry carries the next entry's
            // offset, and the last one ends where the package does.
            let next_offset = if i + 1 < count {
                reader.read_i32::<LittleEndian>()?
            } else {
                (total_size - data_base) as i32
            };

            let size = next_offset.wrapping_sub(current_offset);
            self.file_infos.insert(
                file_name.clone(),
                FileInfo {
                    file_name,
                    offset: current_offset,
                    size,
                    hash,
                    date_created,
                    date_modified,
                },
            );
            current_offset = next_offset;
        }

        Ok(())
    }

    /// Extraction is best-effort: a file that fails to decrypt is omitted
    /// from the result rather than failing the whole parse.
    fn read_file_contents<R: Read + Seek>(&mut self, reader: &mut R, data_base: u64) {
        for (name, info) in &self.file_infos {
            if info.offset < 0 || info.size < 4 {
                warn!(
                    file = %name,
                    offset = info.offset,
                    size = info.size,
                    "skipping file with invalid descriptor"
                );
                continue;
            }

            let mut content = vec![0u8; (info.size - 4) as usize];
            let offset = data_base + info.offset as u64;
            let result = ContentReader::new(&mut *reader, offset, &self.key)
                .and_then(|mut stream| stream.read_exact(&mut content).map_err(Osz2Error::from));

            match result {
                Ok(()) => {
                    self.files.insert(name.clone(), content);
                }
                Err(err) => warn!(file = %name, error = %err, "failed to extract file"),
            }
        }
    }
}

/// Forwards reads while keeping a copy of every byte served, so a region can
/// be hashed against its exact on-wire serialization.
struct CaptureReader<'a, R> {
    inner: &'a mut R,
    captured: Vec<u8>,
}

impl<'a, R: Read> CaptureReader<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            captured: Vec::new(),
        }
    }
}

impl<R: Read> Read for CaptureReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.captured.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

type MetadataMaps = (HashMap<MetaType, String>, HashMap<i16, String>);

fn read_metadata<R: Read>(reader: &mut R, expected: &[u8; 16]) -> Result<MetadataMaps, Osz2Error> {
    let mut capture = CaptureReader::new(reader);

    let count = capture.read_i32::<LittleEndian>()?;
    let mut metadata = HashMap::new();
    let mut unknown = HashMap::new();

    for _ in 0..count {
        let raw_tag = capture.read_i16::<LittleEndian>()?;
        let value = dotnet::read_string(&mut capture)?;

        let tag = MetaType::from(raw_tag);
        if tag == MetaType::Unknown {
            unknown.insert(raw_tag, value.clone());
        }
        metadata.insert(tag, value);
    }

    let digest = osz_hash(&capture.captured, (count as usize).wrapping_mul(3), 0xA7);
    if digest != *expected {
        return Err(Osz2Error::MetadataHashMismatch);
    }

    Ok((metadata, unknown))
}

type FileNameMaps = (HashMap<String, i32>, HashMap<i32, String>);

fn read_file_names<R: Read>(reader: &mut R) -> Result<FileNameMaps, Osz2Error> {
    let count = reader.read_i32::<LittleEndian>()?;
    let mut file_names = HashMap::new();
    let mut file_ids = HashMap::new();

    for _ in 0..count {
        let file_name = dotnet::read_string(reader)?;
        let beatmap_id = reader.read_i32::<LittleEndian>()?;

        file_names.insert(file_name.clone(), beatmap_id);
        file_ids.insert(beatmap_id, file_name);
    }

    Ok((file_names, file_ids))
}
