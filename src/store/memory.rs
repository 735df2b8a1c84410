use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::{
    CollectionSubscription, Document, DocumentStore, DocumentSubscription, StoreError,
    split_doc_path,
};

/// In-memory document store.
///
/// Backs the test suite and a no-network local mode. Writes notify a
/// broadcast feed of changed paths; subscriptions re-read their snapshot
/// whenever a relevant path changes, which gives the same emit-on-every-
/// change contract as the remote store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    docs: Mutex<BTreeMap<String, Document>>,
    changes: broadcast::Sender<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(MemoryInner {
                docs: Mutex::new(BTreeMap::new()),
                changes,
            }),
        }
    }

    /// Direct snapshot access for assertions in tests.
    pub fn document(&self, path: &str) -> Option<Document> {
        self.inner.docs.lock().unwrap().get(path).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInner {
    fn get(&self, path: &str) -> Option<Document> {
        self.docs.lock().unwrap().get(path).cloned()
    }

    fn list(&self, collection: &str) -> Vec<(String, Document)> {
        let prefix = format!("{}/", collection);
        self.docs
            .lock()
            .unwrap()
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, doc)| {
                let id = &path[prefix.len()..];
                // Direct children only; nested collections have their own feeds.
                (!id.is_empty() && !id.contains('/')).then(|| (id.to_string(), doc.clone()))
            })
            .collect()
    }
}

impl DocumentStore for MemoryStore {
    async fn read_once(&self, path: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.get(path))
    }

    async fn read_collection(&self, path: &str) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self.inner.list(path))
    }

    async fn write_merge(&self, path: &str, patch: Document) -> Result<(), StoreError> {
        {
            let mut docs = self.inner.docs.lock().unwrap();
            let doc = docs.entry(path.to_string()).or_default();
            for (field, value) in patch {
                doc.insert(field, value);
            }
        }
        // No receivers is fine; nobody is subscribed yet.
        let _ = self.inner.changes.send(path.to_string());
        Ok(())
    }

    fn subscribe_document(&self, path: &str) -> DocumentSubscription {
        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        DocumentSubscription::spawn(move |tx| async move {
            let mut changes = inner.changes.subscribe();
            if tx.send(inner.get(&path)).is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(changed) if changed == path => {
                        if tx.send(inner.get(&path)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Missed notifications; the snapshot is still current.
                        if tx.send(inner.get(&path)).is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        })
    }

    fn subscribe_collection(&self, path: &str) -> CollectionSubscription {
        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        CollectionSubscription::spawn(move |tx| async move {
            let mut changes = inner.changes.subscribe();
            if tx.send(inner.list(&path)).is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(changed) if split_doc_path(&changed).is_some_and(|(c, _)| c == path) => {
                        if tx.send(inner.list(&path)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if tx.send(inner.list(&path)).is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        })
    }
}
