use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceScanError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceFingerprint {
    pub xml_file_count: usize,
    pub hash_hex: String,
}

/// XML files under `root` as `(normalized relative path, absolute path)`,
/// sorted by relative path. A missing root yields no files.
pub(crate) fn collect_xml_files(root: &Path) -> Result<Vec<(String, PathBuf)>, SourceScanError> {
    let mut files = Vec::<(String, PathBuf)>::new();
    if !root.is_dir() {
        return Ok(files);
    }
    collect_recursive(root, root, &mut files)?;
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

pub(crate) fn fingerprint_xml_sources(root: &Path) -> Result<SourceFingerprint, SourceScanError> {
    let xml_files = collect_xml_files(root)?;
    let mut hasher = Sha256::new();
    for (normalized_rel, abs_path) in &xml_files {
        let bytes = fs::read(abs_path).map_err(|source| SourceScanError::ReadFile {
            path: abs_path.clone(),
            source,
        })?;
        hasher.update(normalized_rel.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
        hasher.update([0u8]);
    }

    Ok(SourceFingerprint {
        xml_file_count: xml_files.len(),
        hash_hex: to_hex_lower(&hasher.finalize()),
    })
}

fn collect_recursive(
    root: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), SourceScanError> {
    let entries = fs::read_dir(current).map_err(|source| SourceScanError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| SourceScanError::ReadDir {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(root, &path, files)?;
            continue;
        }
        if !is_xml_file(&path) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let normalized = normalize_rel_path(rel);
        files.push((normalized, path));
    }
    Ok(())
}

fn is_xml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
