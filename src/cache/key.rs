//! Cache keys for compiled artifacts

use crate::execution::Document;
use std::fmt;

/// Identifies one compiled artifact: namespace prefix, canonical
/// document text and operation name joined with `_`.
///
/// The document is normalized by printing its syntax tree, so formatting
/// differences map to the same key while any change to the selection does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a parsed document
    pub fn new(prefix: &str, document: &Document, operation_name: Option<&str>) -> Self {
        Self::from_canonical(prefix, &document.to_string(), operation_name)
    }

    /// Build a key from already printed document text
    pub fn from_canonical(prefix: &str, document_text: &str, operation_name: Option<&str>) -> Self {
        Self([prefix, document_text, operation_name.unwrap_or("")].join("_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
