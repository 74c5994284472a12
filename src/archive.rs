//! Deployment archive — in-process tar.gz creation with artifact exclusions.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::manifest::ManifestEntry;

/// Entry names excluded from the archive at any depth: version-control
/// metadata, the dependency cache, and build output.
pub const EXCLUDED_NAMES: &[&str] = &["node_modules", ".git", "dist"];

/// Create a gzip-compressed tar archive at `dest` containing every manifest
/// entry under `root`. Directory entries are added recursively with any
/// component named in [`EXCLUDED_NAMES`] skipped. Returns the archive size
/// in bytes.
///
/// An empty manifest still produces a valid (empty) archive.
///
/// # Errors
///
/// Returns an error if `dest` cannot be written or a manifest entry cannot
/// be read.
pub fn create(root: &Path, manifest: &[ManifestEntry], dest: &Path) -> Result<u64> {
    let file = File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in manifest {
        let src = root.join(&entry.path);
        if entry.is_dir {
            append_dir(&mut builder, &src, Path::new(&entry.path))
                .with_context(|| format!("archiving {}/", entry.path))?;
        } else {
            builder
                .append_path_with_name(&src, &entry.path)
                .with_context(|| format!("archiving {}", entry.path))?;
        }
    }

    let encoder = builder.into_inner().context("finishing archive")?;
    let mut writer = encoder.finish().context("compressing archive")?;
    writer.flush().context("flushing archive")?;

    let size = std::fs::metadata(dest)
        .with_context(|| format!("reading size of {}", dest.display()))?
        .len();
    Ok(size)
}

fn append_dir<W: Write>(
    builder: &mut tar::Builder<W>,
    src: &Path,
    archive_name: &Path,
) -> Result<()> {
    builder
        .append_dir(archive_name, src)
        .with_context(|| format!("adding directory {}", src.display()))?;

    // Sorted for a deterministic entry order across runs.
    let mut children: Vec<std::fs::DirEntry> = std::fs::read_dir(src)
        .with_context(|| format!("reading {}", src.display()))?
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("reading {}", src.display()))?;
    children.sort_by_key(std::fs::DirEntry::file_name);

    for child in children {
        let name = child.file_name();
        if is_excluded(&name) {
            continue;
        }
        let path = child.path();
        let child_name = archive_name.join(&name);
        let file_type = child
            .file_type()
            .with_context(|| format!("stat {}", path.display()))?;
        if file_type.is_dir() {
            append_dir(builder, &path, &child_name)?;
        } else {
            builder
                .append_path_with_name(&path, &child_name)
                .with_context(|| format!("adding {}", path.display()))?;
        }
    }
    Ok(())
}

fn is_excluded(name: &std::ffi::OsStr) -> bool {
    EXCLUDED_NAMES.iter().any(|ex| name == std::ffi::OsStr::new(ex))
}

/// SHA-256 digest of the file at `path`, hex-encoded.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 1 << 16];
    loop {
        let n = file
            .read(&mut buffer)
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
