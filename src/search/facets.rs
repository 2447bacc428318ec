//! Facet and sort encoding.
//!
//! Maps URL-level facet selections onto the backend filter expression and
//! parses the `field:direction` sort syntax used by the sort control.

use std::fmt;

use serde::Serialize;

use crate::search::params::SearchParams;

/// A selected facet value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FacetValue {
    Discrete(String),
    Range { min: Option<f64>, max: Option<f64> },
}

impl FacetValue {
    /// Parse a raw URL value. `a..b` with numeric or empty bounds (at least one
    /// present) is a range; anything else is a discrete value.
    pub fn parse(raw: &str) -> Self {
        if let Some((lo, hi)) = raw.split_once("..") {
            let min = parse_bound(lo);
            let max = parse_bound(hi);
            if let (Some(min), Some(max)) = (min, max) {
                if min.is_some() || max.is_some() {
                    return FacetValue::Range { min, max };
                }
            }
        }
        FacetValue::Discrete(raw.to_string())
    }
}

/// `Some(None)` for an empty bound, `Some(Some(n))` for a number, `None` if invalid.
fn parse_bound(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite()).map(Some)
}

/// All selected values for one facet field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetFilter {
    pub field: String,
    pub values: Vec<FacetValue>,
}

impl FacetFilter {
    /// Collect filters for every key of `params` not listed in `reserved`.
    /// Keys that are not plain field names are dropped.
    pub fn from_params(params: &SearchParams, reserved: &[&str]) -> Vec<FacetFilter> {
        params
            .keys()
            .filter(|k| !reserved.contains(k))
            .filter(|k| {
                let ok = is_field_name(k);
                if !ok {
                    tracing::debug!(field = %k, "Ignoring facet with invalid field name");
                }
                ok
            })
            .map(|field| FacetFilter {
                field: field.to_string(),
                values: params
                    .get_all(field)
                    .iter()
                    .filter(|v| !v.is_empty())
                    .map(|v| FacetValue::parse(v))
                    .collect(),
            })
            .filter(|f| !f.values.is_empty())
            .collect()
    }
}

/// Render filters as the backend filter expression, e.g.
/// `Size:"M","L" Price:[10 TO 50]`.
pub fn to_filter_expression(filters: &[FacetFilter]) -> String {
    let mut terms = Vec::new();
    for filter in filters {
        let discrete: Vec<String> = filter
            .values
            .iter()
            .filter_map(|v| match v {
                FacetValue::Discrete(s) => Some(quote(s)),
                FacetValue::Range { .. } => None,
            })
            .collect();
        if !discrete.is_empty() {
            terms.push(format!("{}:{}", filter.field, discrete.join(",")));
        }

        let ranges: Vec<String> = filter
            .values
            .iter()
            .filter_map(|v| match v {
                FacetValue::Range { min, max } => {
                    Some(format!("[{} TO {}]", bound(*min), bound(*max)))
                }
                FacetValue::Discrete(_) => None,
            })
            .collect();
        if !ranges.is_empty() {
            terms.push(format!("{}:{}", filter.field, ranges.join(",")));
        }
    }
    terms.join(" ")
}

/// Field names reach the filter expression unquoted, so only ASCII letters,
/// digits, `_`, `-` and `.` are accepted.
pub fn is_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn bound(value: Option<f64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_else(|| "*".to_string())
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A `field:direction` sort selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    /// Parse `field` or `field:asc|desc` (case-insensitive direction).
    /// Returns `None` for an empty field or an unknown direction.
    pub fn parse(raw: &str) -> Option<Self> {
        let (field, direction) = match raw.split_once(':') {
            Some((field, dir)) => {
                let direction = match dir.to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return None,
                };
                (field, direction)
            }
            None => (raw, SortDirection::Asc),
        };
        let field = field.trim();
        if !is_field_name(field) {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{}", self.field, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_value_json_shape() {
        let values = vec![
            FacetValue::parse("M"),
            FacetValue::parse("10..50"),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            serde_json::json!(["M", {"min": 10.0, "max": 50.0}])
        );
    }

    #[test]
    fn test_facet_value_parse() {
        assert_eq!(FacetValue::parse("M"), FacetValue::Discrete("M".into()));
        assert_eq!(
            FacetValue::parse("10..50"),
            FacetValue::Range { min: Some(10.0), max: Some(50.0) }
        );
        assert_eq!(
            FacetValue::parse("..50"),
            FacetValue::Range { min: None, max: Some(50.0) }
        );
        assert_eq!(FacetValue::parse(".."), FacetValue::Discrete("..".into()));
        assert_eq!(FacetValue::parse("XS..S"), FacetValue::Discrete("XS..S".into()));
    }

    #[test]
    fn test_filters_skip_reserved_keys() {
        let params = SearchParams::parse("?q=tops&Size=M&Size=L&page=2&Price=10..50");
        let filters = FacetFilter::from_params(&params, &["q", "page"]);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].field, "Size");
        assert_eq!(filters[1].field, "Price");
    }

    #[test]
    fn test_filter_expression() {
        let params = SearchParams::parse("?Size=M&Size=L&Price=10..&Brand=Say+%22hi%22");
        let filters = FacetFilter::from_params(&params, &[]);
        assert_eq!(
            to_filter_expression(&filters),
            r#"Size:"M","L" Price:[10 TO *] Brand:"Say \"hi\"""#
        );
    }

    #[test]
    fn test_unsafe_field_names_are_dropped() {
        let params = SearchParams::parse(
            "?Brand+Name=Acme&Size%3A%22x%22+OR+Hidden=1&Color=Red&product_type.id=7",
        );
        let filters = FacetFilter::from_params(&params, &[]);
        let fields: Vec<&str> = filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["Color", "product_type.id"]);
        assert_eq!(
            to_filter_expression(&filters),
            r#"Color:"Red" product_type.id:"7""#
        );
    }

    #[test]
    fn test_is_field_name() {
        assert!(is_field_name("Size"));
        assert!(is_field_name("attr_1.en-US"));
        assert!(!is_field_name(""));
        assert!(!is_field_name("Brand Name"));
        assert!(!is_field_name("Size:\"x\""));
        assert!(!is_field_name("Größe"));
    }

    #[test]
    fn test_sort_order() {
        let sort = SortOrder::parse("price:DESC").unwrap();
        assert_eq!(sort.field, "price");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(sort.to_string(), "price:desc");

        assert_eq!(SortOrder::parse("name").unwrap().to_string(), "name:asc");
        assert!(SortOrder::parse("price:sideways").is_none());
        assert!(SortOrder::parse(":asc").is_none());
        assert!(SortOrder::parse("price desc:asc").is_none());
    }
}
