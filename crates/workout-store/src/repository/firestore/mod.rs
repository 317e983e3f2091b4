//! Firestore Document Store
//!
//! Talks to the Firestore REST API (v1). Reads use `documents.get`, writes go
//! through `documents:commit` so revision preconditions and array transforms
//! are applied server-side.

mod value;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::traits::{Document, DocumentRef, DocumentStore, Precondition, Revision};
use crate::config::FirestoreSettings;
use crate::domain::{DomainError, DomainResult};

/// Characters escaped inside a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Firestore-backed document store
pub struct FirestoreDocumentStore {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    database: String,
    api_key: Option<String>,
}

impl FirestoreDocumentStore {
    pub fn new(settings: &FirestoreSettings) -> DomainResult<Self> {
        if settings.project_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("Firestore project id is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("workout-log/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            database: settings.database.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// `projects/{p}/databases/{db}/documents`
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/{}/documents", self.project_id, self.database)
    }

    /// Resource name used inside request bodies (not escaped)
    fn document_name(&self, doc: &DocumentRef) -> String {
        format!("{}/{}/{}", self.documents_root(), doc.collection, doc.document)
    }

    fn document_url(&self, doc: &DocumentRef) -> String {
        format!(
            "{}/{}/{}/{}",
            self.endpoint,
            self.documents_root(),
            utf8_percent_encode(&doc.collection, PATH_SEGMENT),
            utf8_percent_encode(&doc.document, PATH_SEGMENT)
        )
    }

    fn commit_url(&self) -> String {
        format!("{}/{}:commit", self.endpoint, self.documents_root())
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    async fn send_commit(&self, body: Value) -> DomainResult<String> {
        let response = self
            .with_key(self.client.post(self.commit_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| DomainError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    fn kind(&self) -> &'static str {
        "firestore"
    }

    async fn get(&self, doc: &DocumentRef) -> DomainResult<Option<Document>> {
        let response = self
            .with_key(self.client.get(self.document_url(doc)))
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| DomainError::Transport(e.to_string()))?;
        parse_get_response(status, &text, doc)
    }

    async fn array_remove(&self, doc: &DocumentRef, field: &str, values: &[Value]) -> DomainResult<()> {
        let body = array_remove_body(&self.document_name(doc), field, values);
        self.send_commit(body).await?;
        tracing::debug!("Removed {} value(s) from {}.{}", values.len(), doc, field);
        Ok(())
    }

    async fn commit(
        &self,
        doc: &DocumentRef,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> DomainResult<Revision> {
        let body = commit_body(&self.document_name(doc), &fields, &precondition);
        let text = self.send_commit(body).await?;
        parse_commit_revision(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
    commit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    update_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// A missing document reads as `None`
fn parse_get_response(status: StatusCode, body: &str, doc: &DocumentRef) -> DomainResult<Option<Document>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(classify_error(status, body));
    }
    let raw: RawDocument =
        serde_json::from_str(body).map_err(|e| DomainError::Decode(format!("document {}: {}", doc, e)))?;
    Ok(Some(Document {
        fields: value::decode_fields(&raw.fields)?,
        revision: Revision::new(raw.update_time),
    }))
}

/// The write's own update time, else the commit time
fn parse_commit_revision(body: &str) -> DomainResult<Revision> {
    let response: CommitResponse =
        serde_json::from_str(body).map_err(|e| DomainError::Decode(format!("commit response: {}", e)))?;
    response
        .write_results
        .into_iter()
        .find_map(|result| result.update_time)
        .or(response.commit_time)
        .map(Revision::new)
        .ok_or_else(|| DomainError::Decode("commit response has no update time".to_string()))
}

/// Only the named fields are written; the mask leaves the rest of the document as stored
fn commit_body(name: &str, fields: &Map<String, Value>, precondition: &Precondition) -> Value {
    let current_document = match precondition {
        Precondition::Missing => json!({ "exists": false }),
        Precondition::Revision(revision) => json!({ "updateTime": revision.as_str() }),
    };
    json!({
        "writes": [{
            "update": { "name": name, "fields": value::encode_fields(fields) },
            "updateMask": { "fieldPaths": fields.keys().map(|field| field_path(field)).collect::<Vec<_>>() },
            "currentDocument": current_document,
        }]
    })
}

fn array_remove_body(name: &str, field: &str, values: &[Value]) -> Value {
    json!({
        "writes": [{
            "transform": {
                "document": name,
                "fieldTransforms": [{
                    "fieldPath": field_path(field),
                    "removeAllFromArray": { "values": values.iter().map(value::encode).collect::<Vec<_>>() },
                }],
            },
        }]
    })
}

/// Field paths that are not plain identifiers must be back-quoted
fn field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn classify_error(status: StatusCode, body: &str) -> DomainError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let message = if envelope.error.message.is_empty() {
        body.trim().to_string()
    } else {
        envelope.error.message
    };

    match envelope.error.status.as_str() {
        "FAILED_PRECONDITION" | "ABORTED" | "ALREADY_EXISTS" => DomainError::Conflict(message),
        "NOT_FOUND" => DomainError::NotFound(message),
        _ if status == StatusCode::CONFLICT => DomainError::Conflict(message),
        _ if status == StatusCode::NOT_FOUND => DomainError::NotFound(message),
        _ => DomainError::Transport(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}
