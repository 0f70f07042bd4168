//! Stable identifiers for video sources.

use std::fmt;
use std::sync::Arc;

/// Registry key for a video source, normally its URL.
///
/// Cheap to clone; the manager stores one per record and hands copies out in
/// inspection results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(Arc<str>);

impl SourceKey {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SourceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_trimmed_url() {
        assert_eq!(SourceKey::new(" a.m3u8 "), SourceKey::from("a.m3u8"));
        assert_ne!(SourceKey::from("a.m3u8"), SourceKey::from("b.m3u8"));
    }
}
