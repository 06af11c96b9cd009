//! Core journal types.
//!
//! A [`Photo`] is one saved journal entry: an encoded still plus the quote
//! that was shown with it. A [`Quote`] only lives between capture and save.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered photo entries, newest first.
pub type PhotoList = Vec<Photo>;

/// A quote paired with a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// The quote itself, without surrounding quotation marks.
    pub text: String,

    /// Who said it. Fallback quotes carry no author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Quote {
    /// Create a quote with an author.
    #[must_use]
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Some(author.into()),
        }
    }

    /// Create a quote without an author.
    #[must_use]
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
        }
    }
}

/// A saved journal entry.
///
/// Serialized in camelCase so the persisted document reads
/// `{"id", "imageData", "quote", "author", "timestamp"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Opaque unique identifier.
    pub id: String,

    /// Encoded image as a data URI.
    pub image_data: String,

    /// Quote text.
    pub quote: String,

    /// Quote author, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Photo {
    /// Create a new entry from a captured image and its quote.
    ///
    /// Assigns a fresh id and stamps the current time.
    #[must_use]
    pub fn new(image_data: String, quote: &Quote) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_data,
            quote: quote.text.clone(),
            author: quote.author.clone(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
