//! Circular query regions.
//!
//! A region is a center point plus an angular radius in degrees. Relation
//! tests against grid-cell rectangles drive the prefix-tree covering:
//! longitude clamping is wrap-aware across the ±180° meridian and latitude
//! clamping bounds at the poles.

use geo::{Point, Rect};

use crate::{SpatialError, geodesy};

/// Tolerance for boundary comparisons on accumulated floating error.
const EPSILON: f64 = 1e-9;

/// How a region relates to a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    /// No shared area.
    Disjoint,
    /// Some shared area, but the rectangle is not fully inside.
    Intersects,
    /// The rectangle lies fully inside the region.
    Contains,
}

/// A circular query region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center: Point<f64>,
    radius_deg: f64,
}

impl Circle {
    /// Creates a circle after validating the radius and center.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidRadius`] unless the radius is finite and
    /// positive; [`SpatialError::CoordinateOutOfRange`] when the center is
    /// outside the WGS84 value ranges.
    pub fn new(center: Point<f64>, radius_deg: f64) -> Result<Self, SpatialError> {
        if !radius_deg.is_finite() || radius_deg <= 0.0 {
            return Err(SpatialError::InvalidRadius(radius_deg));
        }
        validate_coordinate(center.x(), center.y())?;
        Ok(Self { center, radius_deg })
    }

    /// Center point.
    #[must_use]
    pub const fn center(&self) -> Point<f64> {
        self.center
    }

    /// Angular radius in degrees.
    #[must_use]
    pub const fn radius_degrees(&self) -> f64 {
        self.radius_deg
    }

    /// True when the point lies on or inside the circle.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        geodesy::arc_degrees(self.center, Point::new(lon, lat)) <= self.radius_deg + EPSILON
    }

    /// Relates the circle to a rectangle (a grid cell's bounds).
    ///
    /// Nearest-point distance decides disjointness; farthest-corner
    /// distance decides containment. Grid cells never cross the
    /// antimeridian, but the query center may sit on the other side of it,
    /// so the longitude clamp wraps.
    #[must_use]
    pub fn relate_rect(&self, rect: &Rect<f64>) -> SpatialRelation {
        let (west, south) = (rect.min().x, rect.min().y);
        let (east, north) = (rect.max().x, rect.max().y);

        let nearest = Point::new(
            clamp_lon(self.center.x(), west, east),
            self.center.y().clamp(south, north),
        );
        if geodesy::arc_degrees(self.center, nearest) > self.radius_deg + EPSILON {
            return SpatialRelation::Disjoint;
        }

        let farthest = [(west, south), (west, north), (east, south), (east, north)]
            .into_iter()
            .map(|(lon, lat)| geodesy::arc_degrees(self.center, Point::new(lon, lat)))
            .fold(0.0_f64, f64::max);
        if farthest <= self.radius_deg + EPSILON {
            SpatialRelation::Contains
        } else {
            SpatialRelation::Intersects
        }
    }
}

/// Validates WGS84 coordinate ranges.
///
/// # Errors
///
/// [`SpatialError::CoordinateOutOfRange`] outside [-180, 180] × [-90, 90].
pub fn validate_coordinate(lon: f64, lat: f64) -> Result<(), SpatialError> {
    if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(SpatialError::CoordinateOutOfRange { lon, lat })
    }
}

/// Nearest longitude within `[west, east]` to `lon`, wrap-aware.
fn clamp_lon(lon: f64, west: f64, east: f64) -> f64 {
    if (west..=east).contains(&lon) {
        return lon;
    }
    if wrap_degrees(west - lon).abs() <= wrap_degrees(east - lon).abs() {
        west
    } else {
        east
    }
}

/// Wraps a longitude delta into `[-180, 180]`.
fn wrap_degrees(mut degrees: f64) -> f64 {
    while degrees > 180.0 {
        degrees -= 360.0;
    }
    while degrees < -180.0 {
        degrees += 360.0;
    }
    degrees
}
