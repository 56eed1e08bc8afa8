// SPDX-License-Identifier: Apache-2.0
//! Geodesy helper that turns a decoded shape into GeoJSON-shaped
//! features, kept separate from the ZONE decoder (`xtoc_wire`) so the
//! wire crate stays pure and the importer owns map-facing rendering.

use serde_json::{json, Value};
use xtoc_wire::templates::common::Location;
use xtoc_wire::templates::zone::Shape;

/// Mean earth radius in metres (WGS-84 authalic sphere approximation),
/// adequate for the short-range circle approximations XTOC zones use.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Minimum vertex count for a circle's polygon approximation.
pub const MIN_CIRCLE_VERTICES: usize = 12;
/// Maximum vertex count for a circle's polygon approximation.
pub const MAX_CIRCLE_VERTICES: usize = 180;

/// One GeoJSON-shaped feature derived from a decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// The packet id this feature was derived from.
    pub packet_id: String,
    /// The feature's GeoJSON `geometry` value.
    pub geometry: Value,
}

/// A point feature at `loc`.
pub fn point_feature(packet_id: &str, loc: Location) -> Feature {
    Feature {
        packet_id: packet_id.to_owned(),
        geometry: json!({
            "type": "Point",
            "coordinates": [loc.lon, loc.lat],
        }),
    }
}

/// A closed-ring polygon feature over `points` (not automatically
/// closed by the caller; this function repeats the first point as the
/// last if it isn't already).
pub fn polygon_feature(packet_id: &str, points: &[Location]) -> Feature {
    let ring = closed_ring(points);
    Feature {
        packet_id: packet_id.to_owned(),
        geometry: json!({
            "type": "Polygon",
            "coordinates": [ring],
        }),
    }
}

fn closed_ring(points: &[Location]) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = points.iter().map(|p| [p.lon, p.lat]).collect();
    if ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    ring
}

/// The arithmetic mean of `points`' coordinates — adequate for the small,
/// near-convex polygons ZONE carries; not a true spherical centroid.
pub fn centroid(points: &[Location]) -> Option<Location> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
    Some(Location { lat, lon })
}

/// Approximate a circle of `radius_metres` centred at `center` as a
/// closed-ring polygon, choosing a vertex count proportional to the
/// circle's size (clamped to `[MIN_CIRCLE_VERTICES, MAX_CIRCLE_VERTICES]`
/// so a 10m circle doesn't get 180 points and a 50km circle doesn't get
/// a visibly faceted outline).
pub fn circle_to_polygon(center: Location, radius_metres: u16) -> Vec<Location> {
    let vertices = vertex_count_for_radius(radius_metres);
    (0..vertices)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let bearing = 2.0 * std::f64::consts::PI * (i as f64) / (vertices as f64);
            destination_point(center, f64::from(radius_metres), bearing)
        })
        .collect()
}

fn vertex_count_for_radius(radius_metres: u16) -> usize {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (f64::from(radius_metres) / 25.0).round() as usize;
    scaled.clamp(MIN_CIRCLE_VERTICES, MAX_CIRCLE_VERTICES)
}

/// The point `distance_metres` from `origin` along `bearing_radians`
/// (0 = north, clockwise), via the standard spherical destination-point
/// formula.
fn destination_point(origin: Location, distance_metres: f64, bearing_radians: f64) -> Location {
    let angular_distance = distance_metres / EARTH_RADIUS_M;
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = (lat1.sin() * angular_distance.cos()
        + lat1.cos() * angular_distance.sin() * bearing_radians.cos())
    .asin();
    let lon2 = lon1
        + (bearing_radians.sin() * angular_distance.sin() * lat1.cos())
            .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

    Location {
        lat: lat2.to_degrees(),
        lon: lon2.to_degrees(),
    }
}

/// Derive the feature set for a decoded ZONE [`Shape`]: a circle yields
/// its polygon approximation plus a centre point; a polygon yields the
/// closed ring plus its centroid.
pub fn features_for_shape(packet_id: &str, shape: &Shape) -> Vec<Feature> {
    match shape {
        Shape::Circle { center, radius_metres } => {
            let ring = circle_to_polygon(*center, *radius_metres);
            vec![
                polygon_feature(packet_id, &ring),
                point_feature(packet_id, *center),
            ]
        }
        Shape::Polygon(points) => {
            let mut features = vec![polygon_feature(packet_id, points)];
            if let Some(c) = centroid(points) {
                features.push(point_feature(packet_id, c));
            }
            features
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn circle_polygon_vertex_count_is_clamped() {
        assert_eq!(vertex_count_for_radius(1), MIN_CIRCLE_VERTICES);
        assert_eq!(vertex_count_for_radius(10_000), MAX_CIRCLE_VERTICES);
    }

    #[test]
    fn circle_polygon_points_sit_near_the_radius() {
        let center = Location { lat: 0.0, lon: 0.0 };
        let ring = circle_to_polygon(center, 1000);
        assert!(ring.len() >= MIN_CIRCLE_VERTICES);
        for p in &ring {
            let dx = p.lon.to_radians() * EARTH_RADIUS_M * center.lat.to_radians().cos();
            let dy = p.lat.to_radians() * EARTH_RADIUS_M;
            let dist = (dx * dx + dy * dy).sqrt();
            assert!((dist - 1000.0).abs() < 5.0, "point {dist}m from centre, expected ~1000m");
        }
    }

    #[test]
    fn features_for_circle_includes_ring_and_centre() {
        let shape = Shape::Circle {
            center: Location { lat: 10.0, lon: 20.0 },
            radius_metres: 100,
        };
        let features = features_for_shape("AAAA0001", &shape);
        assert_eq!(features.len(), 2);
        assert_eq!(features[1].geometry["type"], "Point");
    }

    #[test]
    fn features_for_polygon_includes_ring_and_centroid() {
        let points = vec![
            Location { lat: 0.0, lon: 0.0 },
            Location { lat: 0.0, lon: 1.0 },
            Location { lat: 1.0, lon: 1.0 },
        ];
        let shape = Shape::Polygon(points);
        let features = features_for_shape("AAAA0002", &shape);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].geometry["type"], "Polygon");
    }

    #[test]
    fn closed_ring_repeats_first_point() {
        let points = vec![
            Location { lat: 0.0, lon: 0.0 },
            Location { lat: 0.0, lon: 1.0 },
            Location { lat: 1.0, lon: 1.0 },
        ];
        let ring = closed_ring(&points);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 4);
    }
}
