use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::store::Document;

pub const DEFAULT_QUOTE: &str = "each task shapes who we become.";

fn default_quote() -> String {
    DEFAULT_QUOTE.to_string()
}

/// User-customizable profile fields, stored on the user document.
/// Field names match the stored wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(rename = "profileQuote", default = "default_quote")]
    pub quote: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            photo_url: None,
            quote: default_quote(),
        }
    }
}

impl Profile {
    /// Decode the stored user document. An empty stored quote falls back
    /// to the default, and a missing photo falls back to the identity
    /// provider's photo when one exists.
    pub fn from_document(doc: &Document, fallback_photo: Option<&str>) -> Self {
        let mut profile: Profile =
            serde_json::from_value(serde_json::Value::Object(doc.clone())).unwrap_or_default();
        if profile.quote.trim().is_empty() {
            profile.quote = default_quote();
        }
        if profile.photo_url.is_none() {
            profile.photo_url = fallback_photo.map(str::to_string);
        }
        profile
    }
}

/// One motivational quote shown per user per day, cached so every view of
/// the same day agrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub text: String,
    pub author: String,
}

impl DailyQuote {
    pub fn from_document(doc: &Document) -> Option<Self> {
        serde_json::from_value(serde_json::Value::Object(doc.clone())).ok()
    }

    /// The cache document written under `dailyQuotes/{uid}_{date}`.
    pub fn to_cache_document(&self, user_id: &str, date: NaiveDate) -> Document {
        let mut doc = Document::new();
        doc.insert("userId".into(), user_id.into());
        doc.insert("date".into(), super::day_record::date_key(date).into());
        doc.insert("text".into(), self.text.clone().into());
        doc.insert("author".into(), self.author.clone().into());
        doc
    }

    /// Pick today's quote from the shared catalog. Deterministic by date
    /// (day ordinal modulo catalog size) so concurrent cache misses on
    /// the same day choose the same quote.
    pub fn pick(catalog: &[Self], date: NaiveDate) -> Option<Self> {
        if catalog.is_empty() {
            return None;
        }
        Some(catalog[date.ordinal0() as usize % catalog.len()].clone())
    }
}
