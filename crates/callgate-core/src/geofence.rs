//! Geofence containment predicate.
//!
//! A single static rectangle in latitude/longitude space. Boundaries are
//! inclusive on all four edges.

use serde::{Deserialize, Serialize};

/// Rectangular region of permitted coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Whether the coordinate pair lies inside the box (inclusive).
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.lat_min <= latitude
            && latitude <= self.lat_max
            && self.lon_min <= longitude
            && longitude <= self.lon_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox {
            lat_min: 10.0,
            lat_max: 20.0,
            lon_min: 30.0,
            lon_max: 100.0,
        }
    }

    #[test]
    fn interior_point_is_contained() {
        assert!(bbox().contains(15.0, 60.0));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let b = bbox();
        assert!(b.contains(10.0, 30.0));
        assert!(b.contains(20.0, 100.0));
        assert!(b.contains(10.0, 100.0));
    }

    #[test]
    fn points_outside_are_rejected() {
        let b = bbox();
        assert!(!b.contains(9.999, 60.0));
        assert!(!b.contains(20.001, 60.0));
        assert!(!b.contains(15.0, 29.999));
        assert!(!b.contains(15.0, 100.001));
    }
}
