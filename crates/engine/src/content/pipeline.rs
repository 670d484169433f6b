use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::AppPaths;

use super::atomic_io::write_bytes_atomic;
use super::bank::QuestionBank;
use super::compiler::{compile_question_bank, QuestionCompileError};
use super::hashing::{fingerprint_xml_sources, SourceScanError};

pub(crate) const QUESTION_CACHE_FORMAT_VERSION: u16 = 1;
const QUESTION_CACHE_FILE_NAME: &str = "question_bank.json";

#[derive(Debug, Error)]
pub enum ContentPipelineError {
    #[error(transparent)]
    Scan(#[from] SourceScanError),
    #[error(transparent)]
    Compile(#[from] QuestionCompileError),
    #[error("failed to encode question cache {path}: {source}")]
    EncodeCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write question cache {path}: {source}")]
    WriteCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedQuestionBank {
    format_version: u16,
    input_hash_sha256_hex: String,
    bank: QuestionBank,
}

pub(crate) fn question_cache_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(QUESTION_CACHE_FILE_NAME)
}

/// Reuses the JSON cache when its fingerprint matches the XML sources,
/// otherwise recompiles and rewrites it.
pub fn build_or_load_question_bank(
    app_paths: &AppPaths,
) -> Result<QuestionBank, ContentPipelineError> {
    let fingerprint = fingerprint_xml_sources(&app_paths.questions_dir)?;
    let cache_path = question_cache_path(&app_paths.cache_dir);

    match try_load_cached_bank(&cache_path, &fingerprint.hash_hex) {
        Ok(bank) => {
            info!(
                cache_path = %cache_path.display(),
                input_hash = %fingerprint.hash_hex,
                question_count = bank.len(),
                "question_cache_hit"
            );
            return Ok(bank);
        }
        Err(reason) => {
            info!(
                cache_path = %cache_path.display(),
                reason = %reason,
                xml_file_count = fingerprint.xml_file_count,
                "question_cache_rebuild"
            );
        }
    }

    let bank = compile_question_bank(&app_paths.questions_dir)?;
    let cached = CachedQuestionBank {
        format_version: QUESTION_CACHE_FORMAT_VERSION,
        input_hash_sha256_hex: fingerprint.hash_hex,
        bank,
    };
    let bytes =
        serde_json::to_vec_pretty(&cached).map_err(|source| ContentPipelineError::EncodeCache {
            path: cache_path.clone(),
            source,
        })?;
    write_bytes_atomic(&cache_path, &bytes).map_err(|source| ContentPipelineError::WriteCache {
        path: cache_path.clone(),
        source,
    })?;

    info!(
        question_count = cached.bank.len(),
        total_points = cached.bank.total_points(),
        "question_bank_compiled"
    );
    Ok(cached.bank)
}

fn try_load_cached_bank(cache_path: &Path, expected_hash: &str) -> Result<QuestionBank, String> {
    if !cache_path.exists() {
        return Err("cache missing".to_string());
    }
    let raw = fs::read(cache_path).map_err(|error| format!("cache unreadable: {error}"))?;
    let cached = match serde_json::from_slice::<CachedQuestionBank>(&raw) {
        Ok(cached) => cached,
        Err(error) => {
            warn!(
                cache_path = %cache_path.display(),
                error = %error,
                "question_cache_corrupt"
            );
            return Err("cache corrupt".to_string());
        }
    };
    if cached.format_version != QUESTION_CACHE_FORMAT_VERSION {
        return Err("cache format_version mismatch".to_string());
    }
    if cached.input_hash_sha256_hex != expected_hash {
        return Err("input hash mismatch".to_string());
    }
    Ok(cached.bank)
}
