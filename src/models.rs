//! # Schemas
//!
//! Typed records for the three document collections, plus the validation
//! that guards both directions: payloads coming in over HTTP and documents
//! coming back out of the database.
//!
//! Construction from a raw BSON document goes through `from_document`,
//! which strips the internal `_id` (reels keep it as an opaque external id
//! string) and then enforces the field constraints. A record that fails
//! validation is reported with the offending field name and is never
//! papered over by the fallback path.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, Bson, Document};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::error::AppError;

// Good enough for syntax checking: one @, no whitespace, a dot in the domain.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn now() -> DateTime<Utc> {
    Utc::now()
}

// Documents written by this service carry RFC 3339 strings; other tooling
// may write native BSON datetimes into the same collections. Accept both
// on the way out of the store.
fn datetime_from_bson<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match Bson::deserialize(deserializer)? {
        Bson::String(value) => value.parse().map_err(de::Error::custom),
        Bson::DateTime(value) => DateTime::from_timestamp_millis(value.timestamp_millis())
            .ok_or_else(|| de::Error::custom("timestamp out of range")),
        _ => Err(de::Error::custom("timestamp must be a string or datetime")),
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), AppError> {
    let parsed = Url::parse(value).map_err(|e| AppError::invalid(field, e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::invalid(field, "must be an http(s) URL"));
    }

    Ok(())
}

/// A platform performance snapshot, e.g. Instagram follower counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub platform: String,
    pub followers: i64,
    pub avg_views: i64,
    pub engagement_rate: f64,
    #[serde(default = "now", deserialize_with = "datetime_from_bson")]
    pub last_updated: DateTime<Utc>,
}

impl Metric {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.platform.trim().is_empty() {
            return Err(AppError::invalid("platform", "must not be empty"));
        }
        if self.followers < 0 {
            return Err(AppError::invalid("followers", "must be non-negative"));
        }
        if self.avg_views < 0 {
            return Err(AppError::invalid("avg_views", "must be non-negative"));
        }
        if self.engagement_rate < 0.0 || self.engagement_rate.is_nan() {
            return Err(AppError::invalid("engagement_rate", "must be non-negative"));
        }

        Ok(())
    }

    pub fn from_document(mut document: Document) -> Result<Self, AppError> {
        document.remove("_id");

        let metric: Metric = bson::from_document(document)
            .map_err(|e| AppError::invalid("metric", e.to_string()))?;
        metric.validate()?;

        Ok(metric)
    }
}

/// A short-video content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reel {
    /// Store-assigned, absent until persisted. Never written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default = "now", deserialize_with = "datetime_from_bson")]
    pub posted_at: DateTime<Utc>,
}

impl Reel {
    pub fn validate(&self) -> Result<(), AppError> {
        check_url("thumbnail_url", &self.thumbnail_url)?;

        if let Some(video_url) = &self.video_url {
            check_url("video_url", video_url)?;
        }

        Ok(())
    }

    pub fn from_document(mut document: Document) -> Result<Self, AppError> {
        let id = match document.remove("_id") {
            Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
            _ => None,
        };

        let mut reel: Reel =
            bson::from_document(document).map_err(|e| AppError::invalid("reel", e.to_string()))?;
        reel.id = id;
        reel.validate()?;

        Ok(reel)
    }
}

/// Raw contact-form payload as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub topic: Option<String>,
}

impl ContactInput {
    /// Validates the submission and stamps it with the server-side receipt
    /// time. The client never gets to supply `received_at`.
    pub fn into_message(self) -> Result<ContactMessage, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid("name", "must not be empty"));
        }
        if !EMAIL.is_match(&self.email) {
            return Err(AppError::invalid("email", "must be a valid email address"));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::invalid("message", "must not be empty"));
        }

        Ok(ContactMessage {
            name: self.name,
            email: self.email,
            company: self.company,
            message: self.message,
            topic: self.topic,
            received_at: Utc::now(),
        })
    }
}

/// A validated inbound contact submission, ready to persist.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub received_at: DateTime<Utc>,
}
