//! Multi-valued query parameters.
//!
//! # Responsibilities
//! - Parse a raw query string or a key → value(s) record into a normalized multi-map
//! - Serialize back to a canonical query string (`?k=v&k=v2`)
//! - Toggle facet values (multi-select) or replace them (single-select)
//!
//! # Design Decisions
//! - Distinct keys keep first-seen order; value order per key is preserved
//! - Unknown keys pass through untouched (arbitrary facet fields)
//! - Every transformation returns a new value; the receiver is never mutated

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// A scalar or list value, as delivered by a server-side params record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    fn into_values(self) -> Vec<String> {
        match self {
            ParamValue::One(v) => vec![v],
            ParamValue::Many(vs) => vs,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::One(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::One(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(vs: Vec<String>) -> Self {
        ParamValue::Many(vs)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(vs: Vec<&str>) -> Self {
        ParamValue::Many(vs.into_iter().map(str::to_string).collect())
    }
}

/// Normalized multi-valued search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    entries: Vec<(String, Vec<String>)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.push(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Build from a key → value(s) record. List values flatten into repeated
    /// entries for the same key, in record order.
    pub fn from_record<I, K, V>(record: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let mut params = Self::new();
        for (key, value) in record {
            let key = key.into();
            for v in value.into().into_values() {
                params.push(key.clone(), v);
            }
        }
        params
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, vs)| vs.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get_all(key).iter().any(|v| v == value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Flattened `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical query string: `?k=v&k=v2`, or empty when there are no entries.
    pub fn to_query_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::from("?"));
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Apply a facet toggle and return the resulting parameters.
    ///
    /// Multi-select adds a value that is absent and removes one that is present.
    /// Single-select replaces every existing value for the key; an empty value
    /// clears the key.
    pub fn toggle<I, K, V>(&self, filter: I, single_select: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        for (key, value) in filter {
            let key = key.into();
            let value = value.into();
            if single_select {
                next.remove_key(&key);
                if !value.is_empty() {
                    next.push(key, value);
                }
            } else if next.contains(&key, &value) {
                next.remove_value(&key, &value);
            } else if !value.is_empty() {
                next.push(key, value);
            }
        }
        next
    }

    /// Replace all values of `key` with `value`.
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.toggle([(key.to_string(), value)], true)
    }

    /// Drop `key` entirely.
    pub fn without(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.remove_key(key);
        next
    }

    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    fn remove_key(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    fn remove_value(&mut self, key: &str, value: &str) {
        if let Some((_, values)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            values.retain(|v| v != value);
        }
        self.entries.retain(|(_, vs)| !vs.is_empty());
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl FromStr for SearchParams {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_keys() {
        let params = SearchParams::parse("?q=tops&Size=M&Size=L&Color=red");
        assert_eq!(params.get("q"), Some("tops"));
        assert_eq!(params.get_all("Size"), ["M", "L"]);
        assert_eq!(params.keys().collect::<Vec<_>>(), ["q", "Size", "Color"]);
    }

    #[test]
    fn test_parse_decodes_values() {
        let params = SearchParams::parse("q=red+shirt&Brand=A%26B");
        assert_eq!(params.get("q"), Some("red shirt"));
        assert_eq!(params.get("Brand"), Some("A&B"));
    }

    #[test]
    fn test_from_record_flattens_lists() {
        let params = SearchParams::from_record(vec![
            ("q", ParamValue::from("tops")),
            ("Size", ParamValue::from(vec!["S", "M"])),
            ("Empty", ParamValue::Many(Vec::new())),
        ]);
        assert_eq!(params.to_query_string(), "?q=tops&Size=S&Size=M");
        assert!(!params.contains_key("Empty"));
    }

    #[test]
    fn test_record_value_deserializes_scalar_or_list() {
        let raw = r#"{"q":"tops","Size":["S","M"]}"#;
        let record: std::collections::BTreeMap<String, ParamValue> =
            serde_json::from_str(raw).unwrap();
        let params = SearchParams::from_record(record);
        assert_eq!(params.get_all("Size"), ["S", "M"]);
        assert_eq!(params.get("q"), Some("tops"));
    }

    #[test]
    fn test_empty_serializes_to_empty_string() {
        assert_eq!(SearchParams::new().to_query_string(), "");
        assert_eq!(SearchParams::parse("?").to_query_string(), "");
    }

    #[test]
    fn test_round_trip_is_stable() {
        for raw in [
            "?q=tops&Size=M&Size=L",
            "?Size=M&q=tops&Size=L",
            "?q=a+b&x=%2F%3F&y=",
            "?z=1&a=2&z=3",
        ] {
            let once = SearchParams::parse(raw).to_query_string();
            let twice = SearchParams::parse(&once).to_query_string();
            assert_eq!(once, twice, "unstable for {raw}");
        }
    }

    #[test]
    fn test_multi_select_toggle_is_symmetric() {
        let start = SearchParams::parse("?q=tops");
        let added = start.toggle([("Size", "M")], false);
        assert_eq!(added.to_query_string(), "?q=tops&Size=M");

        let removed = added.toggle([("Size", "M")], false);
        assert_eq!(removed.to_query_string(), "?q=tops");
        assert_eq!(removed, start);
    }

    #[test]
    fn test_multi_select_leaves_other_facets() {
        let start = SearchParams::parse("?q=tops&Color=red&Size=S");
        let next = start.toggle([("Size", "M")], false);
        assert_eq!(next.to_query_string(), "?q=tops&Color=red&Size=S&Size=M");

        let next = next.toggle([("Size", "S")], false);
        assert_eq!(next.to_query_string(), "?q=tops&Color=red&Size=M");
    }

    #[test]
    fn test_single_select_replaces_all_values() {
        let start = SearchParams::parse("?sort_by=a&sort_by=b");
        let next = start.toggle([("sort_by", "c")], true);
        assert_eq!(next.to_query_string(), "?sort_by=c");
        assert_eq!(next.get_all("sort_by").len(), 1);
    }

    #[test]
    fn test_single_select_empty_clears_key() {
        let start = SearchParams::parse("?q=tops&sort_by=price");
        assert_eq!(start.toggle([("sort_by", "")], true).to_query_string(), "?q=tops");
    }

    #[test]
    fn test_toggle_empty_value() {
        let start = SearchParams::parse("?q=tops");
        assert_eq!(start.toggle([("Size", "")], false), start);

        let with_empty = SearchParams::parse("?q=tops&Size=");
        assert_eq!(
            with_empty.toggle([("Size", "")], false).to_query_string(),
            "?q=tops"
        );
    }

    #[test]
    fn test_toggle_creates_absent_key_and_keeps_receiver() {
        let start = SearchParams::new();
        let next = start.toggle([("Color", "blue")], false);
        assert!(start.is_empty());
        assert_eq!(next.to_query_string(), "?Color=blue");
    }

    #[test]
    fn test_with_and_without() {
        let params = SearchParams::parse("?q=tops&page=2");
        assert_eq!(params.with("page", "3").to_query_string(), "?q=tops&page=3");
        assert_eq!(params.without("page").to_query_string(), "?q=tops");
    }
}
