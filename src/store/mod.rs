pub mod error;
pub mod firestore;
pub mod memory;
mod subscription;

use std::future::Future;

use chrono::NaiveDate;

pub use error::StoreError;
pub use subscription::{CollectionSubscription, DocumentSubscription};
pub(crate) use subscription::AbortOnDrop;

use crate::core::day_record::date_key;

/// A stored document: a plain JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Document-oriented persistence addressed by slash-separated paths,
/// with merge writes and push subscriptions that emit on every change.
///
/// Implementations are cheap to clone (shared handle) so callers can
/// move them into spawned write tasks.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Read a single document; `Ok(None)` when it doesn't exist.
    fn read_once(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// List a collection's documents as `(document id, document)` pairs.
    fn read_collection(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Vec<(String, Document)>, StoreError>> + Send;

    /// Merge `patch` into the document at `path`, creating it if absent.
    /// Top-level fields present in the patch replace the stored fields;
    /// fields not mentioned are left untouched.
    fn write_merge(
        &self,
        path: &str,
        patch: Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Subscribe to a single document. The feed emits the current state
    /// immediately and again on every change.
    fn subscribe_document(&self, path: &str) -> DocumentSubscription;

    /// Subscribe to a collection. The feed emits the full listing
    /// immediately and again whenever any document in it changes.
    fn subscribe_collection(&self, path: &str) -> CollectionSubscription;
}

/// `users/{uid}` — profile document.
pub fn user_doc(user_id: &str) -> String {
    format!("users/{}", user_id)
}

/// `users/{uid}/days` — collection of day records.
pub fn days_collection(user_id: &str) -> String {
    format!("users/{}/days", user_id)
}

/// `users/{uid}/days/{YYYY-MM-DD}` — one day record.
pub fn day_doc(user_id: &str, date: NaiveDate) -> String {
    format!("users/{}/days/{}", user_id, date_key(date))
}

/// `dailyQuotes/{uid}_{YYYY-MM-DD}` — per-user daily quote cache.
pub fn daily_quote_doc(user_id: &str, date: NaiveDate) -> String {
    format!("dailyQuotes/{}_{}", user_id, date_key(date))
}

/// Shared catalog of motivational quotes.
pub const QUOTE_COLLECTION: &str = "quote";

/// Parent collection of a document path, and the document's own id.
pub(crate) fn split_doc_path(path: &str) -> Option<(&str, &str)> {
    path.rsplit_once('/')
}
