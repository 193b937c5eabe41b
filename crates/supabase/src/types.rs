//! Wire types for the Storage and PostgREST APIs, and error classification.

use bucketwise_core::storage::{BucketInfo, BucketOptions, StoreError};
use serde::{Deserialize, Serialize};

/// Substring the backend uses when row-level security rejects a write.
const RLS_MARKER: &str = "row-level security policy";
const ALREADY_EXISTS_MARKER: &str = "already exists";

/// Body of bucket create and update requests.
#[derive(Debug, Serialize)]
pub(crate) struct BucketRequest<'a> {
    id: &'a str,
    name: &'a str,
    public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size_limit: Option<u64>,
}

impl<'a> BucketRequest<'a> {
    pub(crate) fn new(name: &'a str, options: &BucketOptions) -> Self {
        Self {
            id: name,
            name,
            public: options.is_public(),
            file_size_limit: options.file_size_limit(),
        }
    }
}

/// One entry of the bucket listing.
#[derive(Debug, Deserialize)]
pub(crate) struct BucketResponse {
    name: String,
}

impl From<BucketResponse> for BucketInfo {
    fn from(bucket: BucketResponse) -> Self {
        Self::named(bucket.name)
    }
}

/// Arguments of the policy provisioning RPC.
#[derive(Debug, Serialize)]
pub(crate) struct PolicyRequest<'a> {
    pub(crate) bucket_name: &'a str,
}

/// Storage errors carry `statusCode` as a string, PostgREST as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddedStatus {
    Text(String),
    Number(u16),
}

impl EmbeddedStatus {
    fn code(&self) -> Option<u16> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "statusCode")]
    status_code: Option<EmbeddedStatus>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a non-success response to a [`StoreError`].
///
/// Permission rejections are recognized by HTTP status, by the `statusCode`
/// embedded in the body, or by the row-level security message, since the
/// backend reports them all three ways.
pub(crate) fn classify(status: u16, body: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let embedded = parsed.status_code.as_ref().and_then(EmbeddedStatus::code);

    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    let lower = message.to_lowercase();

    let is = |code: u16| status == code || embedded == Some(code);

    if is(403) || lower.contains(RLS_MARKER) {
        StoreError::permission_denied(message)
    } else if is(404) {
        StoreError::not_found(message)
    } else if is(409) || lower.contains(ALREADY_EXISTS_MARKER) {
        StoreError::already_exists(message)
    } else {
        StoreError::rejected(status, message)
    }
}
