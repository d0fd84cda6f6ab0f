//! Reading and decrypting `.osz2` beatmap packages.
//!
//! A package bundles named files behind a three-tier cipher stack keyed by a
//! digest derived from its own metadata. [`Package::from_reader`] validates
//! the container, verifies the metadata and file-table hashes, derives the
//! key, and (unless asked for metadata only) materializes every file's
//! decrypted contents.
//!
//! ```no_run
//! use std::fs::File;
//! use osz2_archive::Package;
//!
//! let file = File::open("set.osz2")?;
//! let package = Package::from_reader(file, false)?;
//! for (name, content) in package.files() {
//!     println!("{name}: {} bytes", content.len());
//! }
//! # Ok::<(), osz2_archive::Osz2Error>(())
//! ```

pub mod content;
pub mod dotnet;
pub mod error;
pub mod package;
pub mod structs;

pub use content::ContentReader;
pub use error::Osz2Error;
pub use package::Package;
pub use structs::{FileInfo, MetaType, PackageHeader, PACKAGE_MAGIC};
