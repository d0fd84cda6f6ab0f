use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osz2_archive::Package;
use tracing::warn;

mod report;

use report::PackageReport;

#[derive(Parser)]
#[command(name = "osz2")]
#[command(about = "Inspect and extract .osz2 beatmap packages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt a package and write its files to a directory
    Extract {
        /// Path to the .osz2 package
        input: PathBuf,

        /// Directory to write the extracted files into
        #[arg(short, long)]
        output: PathBuf,

        /// Name of the metadata report written next to the files
        #[arg(long, default_value = "metadata.json")]
        metadata: PathBuf,
    },

    /// Print package metadata as JSON without extracting files
    Inspect {
        /// Path to the .osz2 package
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            input,
            output,
            metadata,
        } => extract(&input, &output, &metadata),
        Commands::Inspect { input } => inspect(&input),
    }
}

fn extract(input: &Path, output: &Path, metadata: &Path) -> Result<()> {
    let file =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let package = Package::from_reader(file, false)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let mut written = 0usize;
    for (name, content) in package.files() {
        let Some(path) = safe_join(output, name) else {
            warn!(file = %name, "skipping file that escapes the output directory");
            continue;
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))?;

        println!("  {name} ({} bytes)", content.len());
        written += 1;
    }

    let report = PackageReport::new(&package);
    let json = serde_json::to_string_pretty(&report).context("failed to serialize metadata")?;
    let metadata_path = if metadata.is_absolute() {
        metadata.to_path_buf()
    } else {
        output.join(metadata)
    };
    fs::write(&metadata_path, json)
        .with_context(|| format!("failed to write {}", metadata_path.display()))?;

    println!("extracted {written} files to {}", output.display());
    println!("metadata written to {}", metadata_path.display());
    Ok(())
}

fn inspect(input: &Path) -> Result<()> {
    let file =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let package = Package::from_reader(file, true)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let report = PackageReport::new(&package);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Join an archived file name onto the output directory, refusing names that
/// would land outside it.
fn safe_join(base: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::safe_join;
    use std::path::Path;

    #[test]
    fn safe_join_rejects_escapes() {
        let base = Path::new("out");
        assert!(safe_join(base, "audio.mp3").is_some());
        assert!(safe_join(base, "sb/background.png").is_some());
        assert!(safe_join(base, "../escape.txt").is_none());
        assert!(safe_join(base, "/etc/passwd").is_none());
    }
}
