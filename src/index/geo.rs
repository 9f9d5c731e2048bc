//! Geographic points and radius search.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuiverError, Result};
use crate::index::doc_table::DocId;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Latitude limit of the web-mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// A longitude/latitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid range.
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(QuiverError::field(format!("Invalid longitude {lon}")));
        }
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
            return Err(QuiverError::field(format!("Invalid latitude {lat}")));
        }
        Ok(GeoPoint { lon, lat })
    }

    /// Parse `"lon,lat"` (or `"lon lat"`).
    pub fn parse(value: &str) -> Result<Self> {
        let mut parts = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(QuiverError::field(format!("Invalid geo value '{value}'")));
        };
        let lon = lon
            .parse::<f64>()
            .map_err(|_| QuiverError::field(format!("Invalid longitude '{lon}'")))?;
        let lat = lat
            .parse::<f64>()
            .map_err(|_| QuiverError::field(format!("Invalid latitude '{lat}'")))?;
        Self::new(lon, lat)
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// Unit of a search radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    /// Convert `distance` in this unit to meters.
    pub fn to_meters(self, distance: f64) -> f64 {
        match self {
            DistanceUnit::Meters => distance,
            DistanceUnit::Kilometers => distance * 1000.0,
            DistanceUnit::Miles => distance * 1609.34,
            DistanceUnit::Feet => distance * 0.3048,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
            DistanceUnit::Feet => "ft",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = QuiverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m" => Ok(DistanceUnit::Meters),
            "km" => Ok(DistanceUnit::Kilometers),
            "mi" => Ok(DistanceUnit::Miles),
            "ft" => Ok(DistanceUnit::Feet),
            _ => Err(QuiverError::query(format!("Unknown distance unit '{s}'"))),
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points of one geo field.
#[derive(Debug, Default)]
pub struct GeoIndex {
    points: Vec<(DocId, GeoPoint)>,
}

impl GeoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points must be added in ascending document order.
    pub fn insert(&mut self, doc_id: DocId, point: GeoPoint) {
        self.points.push((doc_id, point));
    }

    /// Documents within `radius_m` meters of `center`, ascending.
    pub fn within(&self, center: &GeoPoint, radius_m: f64) -> Vec<DocId> {
        let mut ids: Vec<DocId> = self
            .points
            .iter()
            .filter(|(_, point)| point.distance_to(center) <= radius_m)
            .map(|&(id, _)| id)
            .collect();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let point = GeoPoint::parse("-73.9857, 40.7484").unwrap();
        assert_eq!(point.lon, -73.9857);
        assert_eq!(point.lat, 40.7484);

        assert!(GeoPoint::parse("1").is_err());
        assert!(GeoPoint::parse("1,2,3").is_err());
        assert!(GeoPoint::parse("x,2").is_err());
        assert!(GeoPoint::parse("0,89").is_err());
    }

    #[test]
    fn test_distance() {
        // Empire State Building to Times Square, about 1 km.
        let esb = GeoPoint::new(-73.9857, 40.7484).unwrap();
        let times_square = GeoPoint::new(-73.9855, 40.7580).unwrap();
        let d = esb.distance_to(&times_square);
        assert!((1000.0..1100.0).contains(&d), "distance was {d}");
        assert_eq!(esb.distance_to(&esb), 0.0);
    }

    #[test]
    fn test_units() {
        assert_eq!("KM".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert!("yd".parse::<DistanceUnit>().is_err());
        assert_eq!(DistanceUnit::Kilometers.to_meters(2.0), 2000.0);
        assert!((DistanceUnit::Feet.to_meters(1000.0) - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_within() {
        let mut index = GeoIndex::new();
        index.insert(1, GeoPoint::new(-73.9857, 40.7484).unwrap());
        index.insert(2, GeoPoint::new(-73.9855, 40.7580).unwrap());
        index.insert(3, GeoPoint::new(-0.1276, 51.5072).unwrap());

        let center = GeoPoint::new(-73.9857, 40.7484).unwrap();
        assert_eq!(index.within(&center, 500.0), vec![1]);
        assert_eq!(index.within(&center, DistanceUnit::Kilometers.to_meters(2.0)), vec![1, 2]);
    }
}
