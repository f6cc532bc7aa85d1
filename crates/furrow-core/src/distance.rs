//! Euclidean distances on the local plane (meters).
//!
//! The raw-coordinate variants are the primitives; the [`GeoCoord`] variants
//! delegate to the point's own methods.

use crate::geo::GeoCoord;

/// Distance between two (easting, northing) points.
#[inline]
pub fn distance(easting1: f64, northing1: f64, easting2: f64, northing2: f64) -> f64 {
    libm::sqrt(distance_squared(easting1, northing1, easting2, northing2))
}

/// Squared distance between two (easting, northing) points.
#[inline]
pub fn distance_squared(easting1: f64, northing1: f64, easting2: f64, northing2: f64) -> f64 {
    let de = easting1 - easting2;
    let dn = northing1 - northing2;
    de * de + dn * dn
}

#[inline]
pub fn distance_between(a: GeoCoord, b: GeoCoord) -> f64 {
    a.distance(b)
}

#[inline]
pub fn distance_squared_between(a: GeoCoord, b: GeoCoord) -> f64 {
    a.distance_squared(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_raw_and_point_distance_agree() {
        let a = GeoCoord::new(0.0, 0.0);
        let b = GeoCoord::new(3.0, 4.0);

        let d1 = distance(a.easting, a.northing, b.easting, b.northing);
        let d2 = distance_between(a, b);

        assert_abs_diff_eq!(d1, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d2, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_squared_matches_square_of_distance() {
        let a = GeoCoord::new(10.0, 10.0);
        let b = GeoCoord::new(13.0, 14.0);

        let d = distance_between(a, b);
        let ds = distance_squared_between(a, b);

        assert_abs_diff_eq!(ds, d * d, epsilon = 1e-12);
        assert_abs_diff_eq!(ds, 25.0, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn prop_distance_agreement(
            e1 in -1.0e4f64..1.0e4, n1 in -1.0e4f64..1.0e4,
            e2 in -1.0e4f64..1.0e4, n2 in -1.0e4f64..1.0e4,
        ) {
            let a = GeoCoord::new(e1, n1);
            let b = GeoCoord::new(e2, n2);
            let d = distance(e1, n1, e2, n2);
            prop_assert!((d - distance_between(a, b)).abs() <= 1e-9);
            // relative tolerance: squared values reach 8e8 here
            let ds = distance_squared_between(a, b);
            prop_assert!((ds - d * d).abs() <= 1e-9 * ds.max(1.0));
        }
    }
}
