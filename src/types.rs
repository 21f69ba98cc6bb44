//! Wire types for the server API
//!
//! Field names here are part of the HTTP contract and must match the
//! server bit-for-bit (`refresh_token`, `access_token`, `initialized`,
//! `datasets`, `samples`, `count`, `images`, `status`, `message`).
//!
//! The server emits timestamps in HTTP-date (RFC 2822) format, so the
//! timestamp fields use a dedicated serde codec instead of chrono's
//! RFC 3339 default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body of `POST /login`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Long-lived credential, exchanged later for new access tokens
    pub refresh_token: String,
    /// Short-lived bearer credential for protected calls
    pub access_token: String,
}

/// Response body of `POST /refresh`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// The renewed short-lived bearer credential
    pub access_token: String,
}

/// Response body of `GET /setup`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SetupStatus {
    /// True iff an account has already been created
    pub initialized: bool,
}

/// Per-dataset outcome of `POST /register`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterOutcome {
    /// The dataset this outcome refers to
    pub dataset: String,
    /// `"started"` or `"failed"`
    pub status: String,
    /// Human-readable detail, suitable for display
    pub message: String,
}

/// Response body of `POST /register`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// One outcome per requested dataset, in request order
    pub datasets: Vec<RegisterOutcome>,
}

/// One entry of `GET /datasets/`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Dataset name, also the path segment for sample endpoints
    pub name: String,
    /// Free-form dataset metadata; shape is dataset-specific
    #[serde(default)]
    pub info: Option<serde_json::Value>,
    /// When the dataset was created
    #[serde(with = "http_date")]
    pub created_at: DateTime<Utc>,
}

/// Response body of `GET /datasets/`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetListResponse {
    /// All datasets known to the server, ordered by name
    pub datasets: Vec<DatasetSummary>,
}

/// One entry of `GET /datasets/{name}/samples/`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Sample name, unique within its dataset
    pub name: String,
    /// Free-form sample metadata (`label`, `split`, image counts, ...)
    #[serde(default)]
    pub info: Option<serde_json::Value>,
    /// When the sample was registered
    #[serde(with = "http_date")]
    pub created_at: DateTime<Utc>,
    /// When the sample was last modified
    #[serde(with = "http_date")]
    pub last_updated: DateTime<Utc>,
}

/// Response body of `GET /datasets/{name}/samples/`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleListResponse {
    /// The matching samples, in registration order
    pub samples: Vec<SampleSummary>,
}

/// Response body of `GET /datasets/{name}/samples/count`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SampleCountResponse {
    /// Total number of samples in the dataset
    pub count: u64,
}

/// Response body of `GET /datasets/{name}/samples/images`
///
/// An entry is `None` when a sample has no renderable preview image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreviewImagesResponse {
    /// One signed preview URL (or null) per matching sample
    pub images: Vec<Option<String>>,
}

/// Response body of `GET /datasets/{name}/samples/{sample}/images`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleImagesResponse {
    /// Signed URLs for the requested slice of the sample's image sequence
    pub images: Vec<String>,
}

/// Filter parameters shared by the sample listing endpoints
///
/// All fields are always sent; empty strings mean "no filter", matching
/// the server's query semantics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SampleFilter {
    /// Maximum number of results (`None` = server default)
    pub limit: Option<u64>,
    /// Index of the first result
    pub offset: u64,
    /// Sample name prefix to filter by
    pub prefix: String,
    /// Training label to filter by
    pub label: String,
    /// Split class to filter by
    pub split: String,
}

impl SampleFilter {
    /// Render the filter as query pairs in the order the server documents.
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs.push(("offset".to_string(), self.offset.to_string()));
        pairs.push(("prefix".to_string(), self.prefix.clone()));
        pairs.push(("label".to_string(), self.label.clone()));
        pairs.push(("split".to_string(), self.split.clone()));
        pairs
    }
}

/// Serde codec for HTTP-date timestamps ("Mon, 06 Jan 2020 00:00:00 GMT")
mod http_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc2822())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc2822(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
