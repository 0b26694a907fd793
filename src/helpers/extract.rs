//! Snapshot archive extraction
//!
//! Snapshots ship as gzip-compressed tarballs. Extraction is native (tar +
//! flate2), sequential, and reports a running count of files and bytes.
//!
//! Handled entry types: regular files, directories, symbolic links and hard
//! links. Each entry's permission bits are applied after it is written;
//! directory modes wait until the whole archive is unpacked so read-only
//! directories can still receive their children. Anything else (fifos, devices, ...) is skipped with a warning.

use crate::core::error::{Result, TrondError};
use crate::core::fs_utils;
use crate::core::output;
use crate::core::progress::{self, ProgressGuard};
use indicatif::ProgressBar;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

/// Totals for a finished extraction. Only regular files are counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: u64,
    pub bytes: u64,
}

impl ExtractStats {
    fn summary(&self) -> String {
        format!(
            "extracted {} files, {} total",
            self.files,
            output::format_size(self.bytes)
        )
    }
}

// ============================================================================
// Path safety
// ============================================================================

fn normalize_lexical(path: &Path) -> PathBuf {
    // Lexically normalize a path (no filesystem access). Used to validate
    // link targets without following symlinks.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    // Preserve leading ".." for relative paths.
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> Result<()> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| TrondError::UnsafeEntry(format!("outside destination: {}", full_path.display())))?;

    // Reject if any existing path component (including leaf) is a symlink.
    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(TrondError::UnsafeEntry(format!(
                "symlink in path component: {}",
                cur.display()
            )));
        }
    }

    Ok(())
}

fn ensure_within_dest(dest: &Path, candidate: &Path, what: &str) -> Result<()> {
    if normalize_lexical(candidate)
        .strip_prefix(normalize_lexical(dest))
        .is_err()
    {
        return Err(TrondError::UnsafeEntry(format!(
            "{} escapes destination: {}",
            what,
            candidate.display()
        )));
    }
    Ok(())
}

fn ensure_relative(link_name: &Path) -> Result<()> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(TrondError::UnsafeEntry(format!(
            "absolute link target: {}",
            link_name.display()
        )));
    }
    Ok(())
}

// ============================================================================
// Extraction
// ============================================================================

fn create_parent(dest: &Path, full_path: &Path) -> Result<()> {
    if let Some(parent) = full_path.parent() {
        if parent.starts_with(dest) {
            ensure_no_symlink_components(dest, parent)?;
        }
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<bool> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(true)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _link: &Path) -> Result<bool> {
    Ok(false)
}

/// Unpack a tar stream into `dest`, updating `pb` after every entry.
fn extract_tar<R: Read>(reader: R, dest: &Path, pb: &ProgressBar) -> Result<ExtractStats> {
    let mut archive = tar::Archive::new(reader);
    let mut stats = ExtractStats::default();
    let mut dir_modes: Vec<(PathBuf, u32)> = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(TrondError::UnsafeEntry(path.display().to_string()));
        }

        // Some archives contain a "." entry; treat it as a no-op.
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        ensure_no_symlink_components(dest, &full_path)?;

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().unwrap_or(0o644) & 0o7777;

        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&full_path)?;
                dir_modes.push((full_path, mode));
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                create_parent(dest, &full_path)?;
                let mut out = File::create(&full_path)?;
                let written = std::io::copy(&mut entry, &mut out)?;
                drop(out);
                fs_utils::set_mode(&full_path, mode)?;

                stats.files += 1;
                stats.bytes += written;
            }
            tar::EntryType::Symlink => {
                let target = entry
                    .link_name()?
                    .ok_or_else(|| {
                        TrondError::UnsafeEntry(format!("symlink without target: {}", path.display()))
                    })?
                    .into_owned();
                ensure_relative(&target)?;
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_within_dest(dest, &link_parent.join(&target), "symlink target")?;

                create_parent(dest, &full_path)?;
                if !make_symlink(&target, &full_path)? {
                    output::warning(&format!("symlinks unsupported here, skipping {}", path.display()));
                }
            }
            tar::EntryType::Link => {
                let target = entry
                    .link_name()?
                    .ok_or_else(|| {
                        TrondError::UnsafeEntry(format!("hard link without target: {}", path.display()))
                    })?
                    .into_owned();
                ensure_relative(&target)?;
                // Hard link targets are named relative to the archive root.
                let source = dest.join(&target);
                ensure_within_dest(dest, &source, "hard link target")?;

                create_parent(dest, &full_path)?;
                std::fs::hard_link(&source, &full_path)?;
            }
            other => {
                pb.suspend(|| {
                    output::warning(&format!(
                        "skipping unknown entry type {:?}: {}",
                        other,
                        path.display()
                    ))
                });
            }
        }

        pb.set_message(stats.summary());
    }

    // Deepest first, so a read-only parent never blocks a child's chmod.
    dir_modes.sort_by(|a, b| b.0.components().count().cmp(&a.0.components().count()));
    for (dir, mode) in &dir_modes {
        fs_utils::set_mode(dir, *mode)?;
    }

    Ok(stats)
}

/// Extract a `.tgz` archive into `dest`, creating `dest` if needed.
///
/// # Example
/// ```ignore
/// let stats = extract_tgz(Path::new("LiteFullNode_output-directory.tgz"), Path::new("."))?;
/// println!("{} files", stats.files);
/// ```
pub fn extract_tgz(archive_path: &Path, dest: &Path) -> Result<ExtractStats> {
    std::fs::create_dir_all(dest)?;
    // Link checks compare lexically; a relative root like "." would match anything.
    let dest = dest.canonicalize()?;

    let file = File::open(archive_path)?;
    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));

    let filename = archive_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    let pb = progress::create_spinner(&format!("extracting {}", filename));
    let stats = {
        let _guard = ProgressGuard::new(&pb);
        extract_tar(decoder, &dest, &pb)?
    };

    output::detail(&format!("extraction complete: {}", stats.summary()));
    Ok(stats)
}
