//! Protocol header synthesis: content type, DLNA content features, and DLNA
//! transfer mode.

pub mod dlna;

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub use dlna::{
    content_features, mime_from_protocol_info, transfer_mode, DlnaFlags, FeatureSource,
    CONTENT_FEATURES_HEADER, TRANSFER_MODE_HEADER,
};

/// Ordered response headers.
///
/// Names are unique (compared case-insensitively) and keep the position of
/// their first insertion. The last non-empty write wins; an empty value is
/// never stored, so a header without a value is simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header. Returns `false` when `value` is empty and
    /// nothing was written.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
        true
    }

    /// Insert when a value was computed; `None` leaves the set untouched.
    pub fn insert_opt(&mut self, name: &str, value: Option<impl Into<String>>) -> bool {
        match value {
            Some(v) => self.insert(name, v),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_in_place() {
        let mut h = HeaderSet::new();
        h.insert("A", "1");
        h.insert("B", "2");
        h.insert("a", "3");
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn empty_value_never_overwrites() {
        let mut h = HeaderSet::new();
        h.insert("X", "kept");
        assert!(!h.insert("X", ""));
        assert!(!h.insert("Y", ""));
        assert!(!h.insert_opt("Z", None::<String>));
        assert_eq!(h.get("x"), Some("kept"));
        assert_eq!(h.len(), 1);
        assert!(!h.contains("Y"));
    }

    #[test]
    fn serializes_in_order() {
        let mut h = HeaderSet::new();
        h.insert("transferMode.dlna.org", "Streaming");
        h.insert("CaptionInfo.sec", "/x.srt");
        assert_eq!(
            serde_json::to_string(&h).unwrap(),
            r#"{"transferMode.dlna.org":"Streaming","CaptionInfo.sec":"/x.srt"}"#
        );
        assert_eq!(h.remove("captioninfo.sec").as_deref(), Some("/x.srt"));
    }
}
