//! Values carried by document fields.
//!
//! A [`FieldValue`] is what a caller attaches to a field when building a
//! [`crate::document::Document`], what a sortable field keeps per document,
//! and what a lazy value provider hands back at query time.
//!
//! ```
//! use quiver::document::FieldValue;
//!
//! let price = FieldValue::Text("12.5".to_string());
//! assert_eq!(price.as_numeric(), Some(12.5));
//! assert_eq!(FieldValue::Numeric(3.0).as_text(), None);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::geo::GeoPoint;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text, also used for tag lists and `"lon,lat"` points.
    Text(String),
    /// A number.
    Numeric(f64),
    /// A point.
    Geo(GeoPoint),
}

impl FieldValue {
    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The number, parsing text values.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Geo(_) => None,
        }
    }

    /// The point, parsing `"lon,lat"` text values.
    pub fn to_geo(&self) -> Result<Option<GeoPoint>> {
        match self {
            FieldValue::Geo(point) => Ok(Some(*point)),
            FieldValue::Text(s) => GeoPoint::parse(s).map(Some),
            FieldValue::Numeric(_) => Ok(None),
        }
    }

    /// Name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Numeric(_) => "numeric",
            FieldValue::Geo(_) => "geo",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Numeric(value)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(value: GeoPoint) -> Self {
        FieldValue::Geo(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(FieldValue::from("x").as_text(), Some("x"));
        assert_eq!(FieldValue::from(2.5).as_numeric(), Some(2.5));
        assert_eq!(FieldValue::from(" 7 ").as_numeric(), Some(7.0));
        assert_eq!(FieldValue::from("seven").as_numeric(), None);

        let point = FieldValue::from("1.5,2.5").to_geo().unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(1.5, 2.5).unwrap());
        assert!(FieldValue::from("nowhere").to_geo().is_err());
        assert_eq!(FieldValue::Numeric(1.0).to_geo().unwrap(), None);
    }
}
