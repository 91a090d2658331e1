use std::path::Path;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::api::error::ClientError;
use crate::api::types::DatasetInfo;
use crate::logging::{log_validation, Domain};
use crate::shape::TargetFeature;

pub const UPLOAD_EXTENSION: &str = ".csv";
pub const WRONG_EXTENSION_MESSAGE: &str = "Please upload a CSV file";

/// A dataset file that passed client-side checks and is ready to send.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub sha256: String,
}

/// Rejects anything that does not look like a CSV file name. Does no I/O.
pub fn validate_upload_name(path: &Path) -> Result<String, ClientError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    if !name.ends_with(UPLOAD_EXTENSION) {
        log_validation(Domain::Upload, "file", WRONG_EXTENSION_MESSAGE);
        return Err(ClientError::Validation(WRONG_EXTENSION_MESSAGE.to_string()));
    }
    Ok(name)
}

pub async fn prepare_upload(path: &Path) -> Result<UploadFile, ClientError> {
    let name = validate_upload_name(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        let message = format!("Cannot read {}: {}", path.display(), e);
        log_validation(Domain::Upload, "file", &message);
        ClientError::Validation(message)
    })?;
    if bytes.is_empty() {
        let message = format!("{} is empty", name);
        log_validation(Domain::Upload, "file", &message);
        return Err(ClientError::Validation(message));
    }
    let sha256 = bytes_sha256(&bytes);
    Ok(UploadFile { name, bytes, sha256 })
}

pub fn bytes_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassShare {
    pub label: String,
    pub count: f64,
    pub percent: f64,
}

/// Dataset overview: sizes, feature columns and class balance.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub name: Option<String>,
    pub rows: u64,
    pub columns: u64,
    pub feature_columns: Vec<String>,
    pub classes: Vec<ClassShare>,
}

impl DatasetSummary {
    pub fn from_info(info: &DatasetInfo, target: &TargetFeature) -> Self {
        let feature_columns = info
            .columns
            .iter()
            .filter(|c| !target.excludes(c))
            .cloned()
            .collect();
        Self {
            name: info.current_dataset.clone().filter(|n| !n.is_empty()),
            rows: info.num_rows,
            columns: info.num_columns,
            feature_columns,
            classes: class_shares(&info.class_distribution),
        }
    }
}

pub fn class_shares(distribution: &IndexMap<String, f64>) -> Vec<ClassShare> {
    let total: f64 = distribution.values().sum();
    distribution
        .iter()
        .map(|(label, count)| ClassShare {
            label: label.clone(),
            count: *count,
            percent: if total > 0.0 { count / total * 100.0 } else { 0.0 },
        })
        .collect()
}
