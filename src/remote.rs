use serde_json::{Map, Value};

use crate::error::{FengError, Result};
use crate::models::{Collection, Document};

pub const PAGE_SIZE: usize = 100;

pub trait DocumentStore {
    fn list_collections(&self) -> Result<Vec<Collection>>;
    fn get_collection(&self, collection_id: &str) -> Result<Collection>;
    fn list_documents(&self, collection_id: &str, limit: usize, offset: usize) -> Result<Vec<Document>>;
    fn get_document(&self, collection_id: &str, document_id: &str) -> Result<Document>;
    fn create_document(&self, collection_id: &str, document_id: &str, data: &Map<String, Value>) -> Result<Document>;
    fn update_document(&self, collection_id: &str, document_id: &str, data: &Map<String, Value>) -> Result<Document>;
    fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()>;
}

pub trait FileStore {
    /// Upload bytes under `file_id`; returns the id the store assigned.
    fn create_file(&self, bucket_id: &str, file_id: &str, filename: &str, bytes: Vec<u8>) -> Result<String>;
    fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()>;
}

pub trait SchemaStore {
    fn create_string_attribute(&self, collection_id: &str, key: &str, size: u32, required: bool) -> Result<()>;
    fn create_integer_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()>;
    fn create_url_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()>;
    fn create_datetime_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()>;
    fn create_boolean_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()>;
    fn update_string_attribute(&self, collection_id: &str, key: &str, size: u32, required: bool) -> Result<()>;
}

/// Resolve a collection id from its display name. First match wins.
pub fn find_collection_id(store: &impl DocumentStore, name: &str) -> Result<String> {
    store
        .list_collections()?
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .ok_or_else(|| FengError::CollectionNotFound(name.to_string()))
}

/// The most recently updated collection carrying `name`, if any.
pub fn find_latest_collection(store: &impl DocumentStore, name: &str) -> Result<Option<Collection>> {
    Ok(store
        .list_collections()?
        .into_iter()
        .filter(|c| c.name == name)
        .reduce(|latest, c| if c.updated_at > latest.updated_at { c } else { latest }))
}

/// Fetch `PAGE_SIZE` items at a time, by offset, until a short page comes back.
pub fn collect_pages<T>(mut fetch: impl FnMut(usize) -> Result<Vec<T>>) -> Result<Vec<T>> {
    let mut all = Vec::new();
    loop {
        let page = fetch(all.len())?;
        let done = page.len() < PAGE_SIZE;
        all.extend(page);
        if done {
            return Ok(all);
        }
    }
}

pub fn list_all_documents(store: &impl DocumentStore, collection_id: &str) -> Result<Vec<Document>> {
    collect_pages(|offset| store.list_documents(collection_id, PAGE_SIZE, offset))
}
