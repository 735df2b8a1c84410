use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Document;

/// Aborts its task when dropped; the drop is the unsubscribe.
pub(crate) struct AbortOnDrop(JoinHandle<()>);

impl AbortOnDrop {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Push feed for a single document. Emits the current state immediately
/// after subscribing (`None` when the document doesn't exist) and again
/// on every change. Dropping the handle unsubscribes.
pub struct DocumentSubscription {
    rx: mpsc::UnboundedReceiver<Option<Document>>,
    _feed: AbortOnDrop,
}

impl DocumentSubscription {
    pub(crate) fn spawn<F>(
        feed: impl FnOnce(mpsc::UnboundedSender<Option<Document>>) -> F,
    ) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            _feed: AbortOnDrop::spawn(feed(tx)),
        }
    }

    /// Next push, or `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<Option<Document>> {
        self.rx.recv().await
    }
}

/// Push feed for a collection of documents. Each push carries the full
/// `(document id, document)` listing.
pub struct CollectionSubscription {
    rx: mpsc::UnboundedReceiver<Vec<(String, Document)>>,
    _feed: AbortOnDrop,
}

impl CollectionSubscription {
    pub(crate) fn spawn<F>(
        feed: impl FnOnce(mpsc::UnboundedSender<Vec<(String, Document)>>) -> F,
    ) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            _feed: AbortOnDrop::spawn(feed(tx)),
        }
    }

    pub async fn recv(&mut self) -> Option<Vec<(String, Document)>> {
        self.rx.recv().await
    }
}
