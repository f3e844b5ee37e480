//! Error payload returned by every non-2xx API response.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Machine-readable error body.
///
/// `code` is stable across releases; `message` is human-readable and may
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorPayload {
    pub code: CompactString,
    pub message: String,
}

impl ApiErrorPayload {
    pub fn new(code: impl Into<CompactString>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
