use std::time::Duration;

use reqwest::blocking::{multipart, Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::AppwriteConfig;
use crate::error::{FengError, Result};
use crate::models::{ActualAttribute, AttributeType, Collection, Document};
use crate::remote::{collect_pages, DocumentStore, FileStore, SchemaStore, PAGE_SIZE};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Appwrite REST client authenticated with a server API key.
pub struct AppwriteClient {
    http: HttpClient,
    endpoint: String,
    database_id: String,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct CollectionList {
    collections: Vec<RawCollection>,
}

#[derive(Deserialize)]
struct DocumentList {
    documents: Vec<Document>,
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "$id")]
    id: String,
    name: String,
    #[serde(rename = "$updatedAt", default)]
    updated_at: String,
    #[serde(default)]
    attributes: Vec<RawAttribute>,
}

#[derive(Deserialize)]
struct RawAttribute {
    key: String,
    #[serde(rename = "type")]
    kind: AttributeType,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct CreatedFile {
    #[serde(rename = "$id")]
    id: String,
}

impl From<RawAttribute> for ActualAttribute {
    fn from(raw: RawAttribute) -> Self {
        // URL attributes come back as formatted strings.
        let kind = match (raw.kind, raw.format.as_deref()) {
            (AttributeType::String, Some("url")) => AttributeType::Url,
            (kind, _) => kind,
        };
        let size = if kind == AttributeType::String { raw.size } else { None };
        ActualAttribute { key: raw.key, kind, size, required: raw.required, status: raw.status }
    }
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        Collection {
            id: raw.id,
            name: raw.name,
            updated_at: raw.updated_at,
            attributes: raw.attributes.into_iter().map(ActualAttribute::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn query(method: &str, value: usize) -> String {
    json!({ "method": method, "values": [value] }).to_string()
}

fn page_queries(limit: usize, offset: usize) -> Vec<(&'static str, String)> {
    vec![("queries[]", query("limit", limit)), ("queries[]", query("offset", offset))]
}

/// Pull the human-readable message out of an Appwrite error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) if !e.message.is_empty() => e.message,
        _ if body.trim().is_empty() => "empty response".to_string(),
        _ => body.trim().to_string(),
    }
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(FengError::Remote { status: status.as_u16(), message: error_message(&body) })
}

fn header(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| FengError::Settings("configuration contains characters not allowed in HTTP headers".into()))
}

impl AppwriteClient {
    pub fn new(config: &AppwriteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-appwrite-project"), header(&config.project_id)?);
        let mut key = header(&config.api_key)?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-appwrite-key"), key);

        let http = HttpClient::builder()
            .timeout(TIMEOUT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
        })
    }

    fn collections_url(&self) -> String {
        format!("{}/databases/{}/collections", self.endpoint, self.database_id)
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!("{}/{collection_id}/documents", self.collections_url())
    }

    fn attributes_url(&self, collection_id: &str) -> String {
        format!("{}/{collection_id}/attributes", self.collections_url())
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check(request.send()?)?;
        Ok(response.json()?)
    }

    fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        check(request.send()?)?;
        Ok(())
    }

    fn json_request(&self, request: RequestBuilder, body: &Value) -> RequestBuilder {
        request.header(CONTENT_TYPE, "application/json").json(body)
    }

    fn create_attribute(&self, collection_id: &str, kind: &str, body: Value) -> Result<()> {
        let url = format!("{}/{kind}", self.attributes_url(collection_id));
        debug!(%url, "creating attribute");
        self.send_empty(self.json_request(self.http.post(url), &body))
    }
}

impl DocumentStore for AppwriteClient {
    fn list_collections(&self) -> Result<Vec<Collection>> {
        let url = self.collections_url();
        debug!(%url, "listing collections");
        let raw = collect_pages(|offset| {
            let list: CollectionList =
                self.send(self.http.get(&url).query(&page_queries(PAGE_SIZE, offset)))?;
            Ok(list.collections)
        })?;
        Ok(raw.into_iter().map(Collection::from).collect())
    }

    fn get_collection(&self, collection_id: &str) -> Result<Collection> {
        let url = format!("{}/{collection_id}", self.collections_url());
        let raw: RawCollection = self.send(self.http.get(url))?;
        Ok(raw.into())
    }

    fn list_documents(&self, collection_id: &str, limit: usize, offset: usize) -> Result<Vec<Document>> {
        let url = self.documents_url(collection_id);
        debug!(%url, limit, offset, "listing documents");
        let list: DocumentList = self.send(self.http.get(url).query(&page_queries(limit, offset)))?;
        Ok(list.documents)
    }

    fn get_document(&self, collection_id: &str, document_id: &str) -> Result<Document> {
        let url = format!("{}/{document_id}", self.documents_url(collection_id));
        self.send(self.http.get(url))
    }

    fn create_document(&self, collection_id: &str, document_id: &str, data: &Map<String, Value>) -> Result<Document> {
        let url = self.documents_url(collection_id);
        debug!(%url, document_id, "creating document");
        let body = json!({ "documentId": document_id, "data": data });
        self.send(self.json_request(self.http.post(url), &body))
    }

    fn update_document(&self, collection_id: &str, document_id: &str, data: &Map<String, Value>) -> Result<Document> {
        let url = format!("{}/{document_id}", self.documents_url(collection_id));
        debug!(%url, "updating document");
        let body = json!({ "data": data });
        self.send(self.json_request(self.http.patch(url), &body))
    }

    fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        let url = format!("{}/{document_id}", self.documents_url(collection_id));
        debug!(%url, "deleting document");
        self.send_empty(self.http.delete(url))
    }
}

impl FileStore for AppwriteClient {
    fn create_file(&self, bucket_id: &str, file_id: &str, filename: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/storage/buckets/{bucket_id}/files", self.endpoint);
        debug!(%url, file_id, filename, size = bytes.len(), "uploading file");
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new()
            .text("fileId", file_id.to_string())
            .part("file", part);
        let created: CreatedFile = self.send(self.http.post(url).multipart(form))?;
        Ok(created.id)
    }

    fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<()> {
        let url = format!("{}/storage/buckets/{bucket_id}/files/{file_id}", self.endpoint);
        debug!(%url, "deleting file");
        self.send_empty(self.http.delete(url))
    }
}

impl SchemaStore for AppwriteClient {
    fn create_string_attribute(&self, collection_id: &str, key: &str, size: u32, required: bool) -> Result<()> {
        self.create_attribute(collection_id, "string", json!({ "key": key, "size": size, "required": required }))
    }

    fn create_integer_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()> {
        self.create_attribute(collection_id, "integer", json!({ "key": key, "required": required }))
    }

    fn create_url_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()> {
        self.create_attribute(collection_id, "url", json!({ "key": key, "required": required }))
    }

    fn create_datetime_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()> {
        self.create_attribute(collection_id, "datetime", json!({ "key": key, "required": required }))
    }

    fn create_boolean_attribute(&self, collection_id: &str, key: &str, required: bool) -> Result<()> {
        self.create_attribute(collection_id, "boolean", json!({ "key": key, "required": required }))
    }

    fn update_string_attribute(&self, collection_id: &str, key: &str, size: u32, required: bool) -> Result<()> {
        let url = format!("{}/string/{key}", self.attributes_url(collection_id));
        debug!(%url, size, "updating string attribute");
        let body = json!({ "required": required, "default": null, "size": size });
        self.send_empty(self.json_request(self.http.patch(url), &body))
    }
}
