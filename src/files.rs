use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::AppwriteConfig;
use crate::entities::{EntityKind, FileColumn};
use crate::error::{FengError, Result};
use crate::models::Document;
use crate::remote::{DocumentStore, FileStore};

fn file_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/files/([^/]+)/view").expect("valid regex"))
}

/// Generate an id in the store's own format: hex seconds, 5 hex digits of
/// sub-second time, then 7 random hex digits.
pub fn unique_id() -> String {
    let now = chrono::Utc::now();
    let millis = now.timestamp_subsec_millis();
    let mut rng = rand::thread_rng();
    let padding: String = (0..7)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect();
    format!("{:x}{:05x}{padding}", now.timestamp(), millis)
}

/// Recover the file id from a storage view URL (`.../files/{id}/view?...`).
pub fn extract_file_id(url: &str) -> Option<&str> {
    file_id_pattern()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn file_view_url(config: &AppwriteConfig, bucket_id: &str, file_id: &str) -> String {
    format!(
        "{}/storage/buckets/{bucket_id}/files/{file_id}/view?project={}",
        config.endpoint, config.project_id
    )
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn remove_file_best_effort(files: &impl FileStore, bucket_id: &str, url: &str) -> bool {
    match extract_file_id(url) {
        Some(file_id) => remove_file_by_id(files, bucket_id, file_id),
        None => false,
    }
}

fn remove_file_by_id(files: &impl FileStore, bucket_id: &str, file_id: &str) -> bool {
    match files.delete_file(bucket_id, file_id) {
        Ok(()) => {
            info!(file_id, "deleted stored file");
            true
        }
        Err(e) => {
            warn!(file_id, error = %e, "failed to delete stored file");
            false
        }
    }
}

#[derive(Debug)]
pub struct DeleteResult {
    pub files_removed: usize,
}

/// Delete a document and, best effort, every storage file its file columns point at.
pub fn delete_document_with_files<S>(
    store: &S,
    entity: EntityKind,
    collection_id: &str,
    document_id: &str,
    bucket_id: Option<&str>,
) -> Result<DeleteResult>
where
    S: DocumentStore + FileStore,
{
    let mut files_removed = 0;
    if let Some(bucket_id) = bucket_id {
        if !entity.file_columns().is_empty() {
            let doc = store.get_document(collection_id, document_id)?;
            for fc in entity.file_columns() {
                if let Some(url) = doc.str_field(fc.column) {
                    if remove_file_best_effort(store, bucket_id, url) {
                        files_removed += 1;
                    }
                }
            }
        }
    }
    store.delete_document(collection_id, document_id)?;
    Ok(DeleteResult { files_removed })
}

#[derive(Debug)]
pub struct AttachResult {
    pub document: Document,
    pub url: String,
    pub replaced: bool,
}

/// Upload `bytes` and point `column` of the document at it.
///
/// When the column has a hash companion it receives the SHA-256 of the bytes. The file the
/// column referenced before is deleted once the document update succeeds.
#[allow(clippy::too_many_arguments)]
pub fn attach_file<S>(
    store: &S,
    config: &AppwriteConfig,
    entity: EntityKind,
    collection_id: &str,
    document_id: &str,
    column: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<AttachResult>
where
    S: DocumentStore + FileStore,
{
    let bucket_id = config.bucket_id.as_deref().ok_or(FengError::MissingConfig("bucket"))?;
    if entity.column(column).is_none() {
        return Err(FengError::Other(format!("{} has no column {column}", entity.display_name())));
    }
    let file_column: &FileColumn = entity
        .file_columns()
        .iter()
        .find(|fc| fc.column == column)
        .ok_or_else(|| {
            FengError::Other(format!("{}.{column} does not hold a file", entity.display_name()))
        })?;

    let previous = store.get_document(collection_id, document_id)?;
    let hash = sha256_hex(&bytes);
    let file_id = store.create_file(bucket_id, &unique_id(), filename, bytes)?;
    let url = file_view_url(config, bucket_id, &file_id);

    let mut data = Map::new();
    data.insert(column.to_string(), Value::from(url.clone()));
    if let Some(hash_column) = file_column.hash_column {
        data.insert(hash_column.to_string(), Value::from(hash));
    }
    let document = match store.update_document(collection_id, document_id, &data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(file_id = %file_id, error = %e, "document update failed, removing uploaded file");
            remove_file_by_id(store, bucket_id, &file_id);
            return Err(e);
        }
    };

    let replaced = previous
        .str_field(column)
        .filter(|old| extract_file_id(old) != Some(file_id.as_str()))
        .map(|old| remove_file_best_effort(store, bucket_id, old))
        .unwrap_or(false);

    Ok(AttachResult { document, url, replaced })
}
