use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

use super::{
    CollectionSubscription, Document, DocumentStore, DocumentSubscription, StoreError,
};
use crate::auth::IdTokenSlot;
use crate::config::MotimeConfig;

const POLL_BACKOFF_MIN: Duration = Duration::from_secs(1);
const POLL_BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Document store backed by the Firestore REST API.
///
/// The REST surface has no push channel, so subscriptions poll at the
/// configured interval and emit only when the fetched state differs from
/// the last emission. Poll failures retry with capped exponential
/// backoff. Requests carry the signed-in user's bearer token from the
/// shared slot filled by the identity provider.
#[derive(Clone)]
pub struct FirestoreStore {
    http: Client,
    documents_url: String,
    token: IdTokenSlot,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub fn new(config: &MotimeConfig, token: IdTokenSlot) -> Result<Self, StoreError> {
        let http = Client::builder()
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            documents_url: config.firestore_documents_url(),
            token,
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_url, path)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token.get() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn fetch(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<(StatusCode, String), StoreError> {
        let mut builder = self.request(method, url).query(query);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| StoreError::Network(format!("failed to read response: {}", e)))?;
        Ok((status, text))
    }

    fn check_status(path: &str, status: StatusCode, body: &str) -> Result<(), StoreError> {
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        Err(StoreError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        })
    }
}

impl DocumentStore for FirestoreStore {
    async fn read_once(&self, path: &str) -> Result<Option<Document>, StoreError> {
        let (status, body) = self.fetch(Method::GET, &self.url(path), &[], None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(path, status, &body)?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::malformed(path, e.to_string()))?;
        Ok(Some(from_firestore_document(&parsed)))
    }

    async fn read_collection(&self, path: &str) -> Result<Vec<(String, Document)>, StoreError> {
        let url = self.url(path);
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = Vec::new();
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let (status, body) = self.fetch(Method::GET, &url, &query, None).await?;
            Self::check_status(path, status, &body)?;
            let parsed: Value = serde_json::from_str(&body)
                .map_err(|e| StoreError::malformed(path, e.to_string()))?;

            if let Some(listed) = parsed.get("documents").and_then(Value::as_array) {
                for doc in listed {
                    let name = doc.get("name").and_then(Value::as_str).unwrap_or_default();
                    docs.push((
                        doc_id_from_name(name).to_string(),
                        from_firestore_document(doc),
                    ));
                }
            }

            match parsed.get("nextPageToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(docs)
    }

    async fn write_merge(&self, path: &str, patch: Document) -> Result<(), StoreError> {
        let mask = update_mask(&patch);
        let body = json!({ "fields": to_firestore_fields(&patch) });
        let (status, text) = self
            .fetch(Method::PATCH, &self.url(path), &mask, Some(body))
            .await?;
        Self::check_status(path, status, &text)
    }

    fn subscribe_document(&self, path: &str) -> DocumentSubscription {
        let store = self.clone();
        let path = path.to_string();
        DocumentSubscription::spawn(move |tx| async move {
            let mut last: Option<Option<Document>> = None;
            let mut backoff = POLL_BACKOFF_MIN;
            loop {
                match store.read_once(&path).await {
                    Ok(doc) => {
                        backoff = POLL_BACKOFF_MIN;
                        if last.as_ref() != Some(&doc) {
                            last = Some(doc.clone());
                            if tx.send(doc).is_err() {
                                return;
                            }
                        }
                        tokio::time::sleep(store.poll_interval).await;
                    }
                    Err(e) => {
                        log::warn!("poll of {} failed: {}; retrying in {:?}", path, e, backoff);
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(POLL_BACKOFF_MAX);
                    }
                }
            }
        })
    }

    fn subscribe_collection(&self, path: &str) -> CollectionSubscription {
        let store = self.clone();
        let path = path.to_string();
        CollectionSubscription::spawn(move |tx| async move {
            let mut last: Option<Vec<(String, Document)>> = None;
            let mut backoff = POLL_BACKOFF_MIN;
            loop {
                match store.read_collection(&path).await {
                    Ok(docs) => {
                        backoff = POLL_BACKOFF_MIN;
                        if last.as_ref() != Some(&docs) {
                            last = Some(docs.clone());
                            if tx.send(docs).is_err() {
                                return;
                            }
                        }
                        tokio::time::sleep(store.poll_interval).await;
                    }
                    Err(e) => {
                        log::warn!("poll of {} failed: {}; retrying in {:?}", path, e, backoff);
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(POLL_BACKOFF_MAX);
                    }
                }
            }
        })
    }
}

/// Repeated `updateMask.fieldPaths` params, one per top-level field, so
/// the PATCH merges instead of replacing the whole document.
fn update_mask(patch: &Document) -> Vec<(&'static str, String)> {
    patch
        .keys()
        .map(|field| ("updateMask.fieldPaths", field.clone()))
        .collect()
}

fn doc_id_from_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Plain JSON -> Firestore typed-value fields map.
fn to_firestore_fields(doc: &Document) -> Value {
    Value::Object(
        doc.iter()
            .map(|(field, value)| (field.clone(), to_firestore_value(value)))
            .collect(),
    )
}

fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": {
                "values": items.iter().map(to_firestore_value).collect::<Vec<_>>()
            }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(k, v)| (k.clone(), to_firestore_value(v)))
                    .collect::<serde_json::Map<_, _>>()
            }
        }),
    }
}

/// Firestore document body -> plain JSON object. Documents created with
/// no fields come back without a `fields` key and decode as empty.
fn from_firestore_document(body: &Value) -> Document {
    body.get("fields")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(field, value)| (field.clone(), from_firestore_value(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn from_firestore_value(value: &Value) -> Value {
    let Some(map) = value.as_object() else {
        return Value::Null;
    };
    if let Some((kind, inner)) = map.iter().next() {
        match kind.as_str() {
            "nullValue" => Value::Null,
            "booleanValue" => inner.clone(),
            "integerValue" => match inner {
                Value::String(s) => s
                    .parse::<i64>()
                    .map(|i| Value::Number(i.into()))
                    .unwrap_or(Value::Null),
                Value::Number(_) => inner.clone(),
                _ => Value::Null,
            },
            "doubleValue" => inner.clone(),
            "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
            "mapValue" => Value::Object(
                inner
                    .get("fields")
                    .and_then(Value::as_object)
                    .map(|fields| {
                        fields
                            .iter()
                            .map(|(k, v)| (k.clone(), from_firestore_value(v)))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            "arrayValue" => Value::Array(
                inner
                    .get("values")
                    .and_then(Value::as_array)
                    .map(|values| values.iter().map(from_firestore_value).collect())
                    .unwrap_or_default(),
            ),
            other => {
                log::debug!("unhandled firestore value kind: {}", other);
                Value::Null
            }
        }
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_record_survives_value_translation() {
        let doc: Document = serde_json::from_str(
            r#"{
                "tasks": {
                    "Study": [{"id": "00000000-0000-0000-0000-000000000001",
                               "title": "Read", "done": false}]
                },
                "categories": ["Study"]
            }"#,
        )
        .unwrap();

        let wire = json!({ "name": "projects/p/databases/(default)/documents/users/u1/days/2024-06-01",
                           "fields": to_firestore_fields(&doc) });
        assert_eq!(from_firestore_document(&wire), doc);
    }

    #[test]
    fn typed_values_decode() {
        assert_eq!(
            from_firestore_value(&json!({"integerValue": "42"})),
            json!(42)
        );
        assert_eq!(
            from_firestore_value(&json!({"booleanValue": true})),
            json!(true)
        );
        assert_eq!(
            from_firestore_value(&json!({"stringValue": "hi"})),
            json!("hi")
        );
        assert_eq!(from_firestore_value(&json!({"nullValue": null})), Value::Null);
        assert_eq!(
            from_firestore_value(&json!({"arrayValue": {}})),
            json!([])
        );
    }

    #[test]
    fn empty_document_decodes_to_empty_object() {
        let wire = json!({ "name": "projects/p/databases/(default)/documents/users/u1" });
        assert!(from_firestore_document(&wire).is_empty());
    }

    #[test]
    fn update_mask_names_each_top_level_field() {
        let patch: Document =
            serde_json::from_str(r#"{"tasks": {}, "categories": []}"#).unwrap();
        let mask = update_mask(&patch);
        let fields: Vec<&str> = mask.iter().map(|(_, f)| f.as_str()).collect();
        assert!(fields.contains(&"tasks"));
        assert!(fields.contains(&"categories"));
        assert!(mask.iter().all(|(k, _)| *k == "updateMask.fieldPaths"));
    }

    #[test]
    fn doc_id_comes_from_resource_name() {
        assert_eq!(
            doc_id_from_name("projects/p/databases/(default)/documents/users/u1/days/2024-06-01"),
            "2024-06-01"
        );
    }
}
