use nalgebra::Vector2;

use crate::angle::{normalize_positive, to_radians};
use crate::distance;

// ---------------------------------------------------------------------------
// Local-plane point
// ---------------------------------------------------------------------------

/// A position on the local tangent plane, meters east and north of the plane
/// origin. Carries no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoCoord {
    pub easting: f64,
    pub northing: f64,
}

impl GeoCoord {
    pub const fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }

    pub fn distance(self, other: GeoCoord) -> f64 {
        distance::distance(self.easting, self.northing, other.easting, other.northing)
    }

    pub fn distance_squared(self, other: GeoCoord) -> f64 {
        distance::distance_squared(self.easting, self.northing, other.easting, other.northing)
    }

    /// Compass bearing to `other`: 0 = north, increasing clockwise, in `[0, 2π)`.
    ///
    /// Returns `None` for coincident points, where no bearing exists.
    pub fn bearing_to(self, other: GeoCoord) -> Option<f64> {
        let de = other.easting - self.easting;
        let dn = other.northing - self.northing;
        if de == 0.0 && dn == 0.0 {
            return None;
        }
        Some(normalize_positive(libm::atan2(de, dn)))
    }

    pub fn is_finite(self) -> bool {
        self.easting.is_finite() && self.northing.is_finite()
    }

    /// (easting, northing) as a column vector.
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.easting, self.northing)
    }

    pub fn from_vector(v: Vector2<f64>) -> Self {
        Self::new(v.x, v.y)
    }
}

// ---------------------------------------------------------------------------
// WGS84 <-> local plane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wgs84 {
    pub latitude: f64,
    pub longitude: f64,
}

impl Wgs84 {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Flat-earth projection anchored at a start latitude/longitude.
///
/// Meters-per-degree use the series expansions for the WGS84 ellipsoid. The
/// longitude scale depends on latitude and is re-evaluated per point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalPlane {
    origin: Wgs84,
    m_per_degree_lat: f64,
}

impl LocalPlane {
    pub fn new(lat_start: f64, lon_start: f64) -> Self {
        Self {
            origin: Wgs84::new(lat_start, lon_start),
            m_per_degree_lat: meters_per_degree_lat(lat_start),
        }
    }

    pub fn origin(&self) -> Wgs84 {
        self.origin
    }

    pub fn m_per_degree_lat(&self) -> f64 {
        self.m_per_degree_lat
    }

    pub fn to_local(&self, latitude: f64, longitude: f64) -> GeoCoord {
        let northing = (latitude - self.origin.latitude) * self.m_per_degree_lat;
        let easting = (longitude - self.origin.longitude) * meters_per_degree_lon(latitude);
        GeoCoord::new(easting, northing)
    }

    pub fn to_wgs84(&self, coord: GeoCoord) -> Wgs84 {
        let latitude = coord.northing / self.m_per_degree_lat + self.origin.latitude;
        let longitude = coord.easting / meters_per_degree_lon(latitude) + self.origin.longitude;
        Wgs84::new(latitude, longitude)
    }
}

pub fn meters_per_degree_lat(latitude: f64) -> f64 {
    let phi = to_radians(latitude);
    111_132.92 - 559.82 * libm::cos(2.0 * phi) + 1.175 * libm::cos(4.0 * phi)
        - 0.0023 * libm::cos(6.0 * phi)
}

pub fn meters_per_degree_lon(latitude: f64) -> f64 {
    let phi = to_radians(latitude);
    111_412.84 * libm::cos(phi) - 93.5 * libm::cos(3.0 * phi) + 0.118 * libm::cos(5.0 * phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::{to_degrees, PI_BY_2};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bearing_compass_convention() {
        let origin = GeoCoord::new(0.0, 0.0);
        let north = origin.bearing_to(GeoCoord::new(0.0, 1.0)).unwrap();
        let east = origin.bearing_to(GeoCoord::new(1.0, 0.0)).unwrap();
        let west = origin.bearing_to(GeoCoord::new(-1.0, 0.0)).unwrap();

        assert_abs_diff_eq!(north, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(east, PI_BY_2, epsilon = 1e-12);
        assert_abs_diff_eq!(to_degrees(west), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_coincident_points() {
        let p = GeoCoord::new(5.0, 5.0);
        assert!(p.bearing_to(p).is_none());
    }

    #[test]
    fn test_vector_conversion() {
        let p = GeoCoord::new(1.5, -2.0);
        let v = p.to_vector();
        assert_eq!(v.x, 1.5);
        assert_eq!(v.y, -2.0);
        assert_eq!(GeoCoord::from_vector(v), p);
    }

    #[test]
    fn test_meters_per_degree_at_reference_latitudes() {
        // ~110.57 km at the equator, ~111.69 km at the poles
        assert_abs_diff_eq!(meters_per_degree_lat(0.0), 110_574.3, epsilon = 1.0);
        assert_abs_diff_eq!(meters_per_degree_lat(90.0), 111_693.9, epsilon = 1.0);
        assert_abs_diff_eq!(meters_per_degree_lon(0.0), 111_319.5, epsilon = 1.0);
        assert!(meters_per_degree_lon(60.0) < 56_000.0);
    }

    #[test]
    fn test_local_plane_roundtrip() {
        let plane = LocalPlane::new(53.436_056_4, -111.160_047);
        let local = plane.to_local(53.437, -111.158);
        assert!(local.northing > 100.0 && local.easting > 100.0);

        let back = plane.to_wgs84(local);
        assert_abs_diff_eq!(back.latitude, 53.437, epsilon = 1e-9);
        // longitude scale is evaluated at slightly different latitudes
        assert_abs_diff_eq!(back.longitude, -111.158, epsilon = 1e-6);
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let plane = LocalPlane::new(35.0, -106.0);
        let local = plane.to_local(35.0, -106.0);
        assert_abs_diff_eq!(local.easting, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(local.northing, 0.0, epsilon = 1e-9);
    }
}
