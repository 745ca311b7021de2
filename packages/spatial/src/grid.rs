//! Geohash prefix grid.
//!
//! Cells are geohash strings over the base-32 alphabet; depth equals token
//! length and each level subdivides its parent into 32 children that
//! partition the parent's area. A point indexes as its full ancestor chain
//! (every prefix of its max-depth hash), which turns region containment
//! into term overlap: a point lies in a cell exactly when the cell's token
//! appears in the chain.

use std::collections::VecDeque;

use geo::Point;

use crate::region::{Circle, SpatialRelation};
use crate::{SpatialError, region};

/// Geohash base-32 symbol set, in canonical order.
///
/// Children are visited in this order, which keeps covering output
/// deterministic across runs.
const BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Deepest precision the geohash alphabet supports.
pub const MAX_GRID_LEVELS: usize = 12;

/// A cell selected by a region covering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCover {
    /// The cell's token (a geohash prefix).
    pub token: String,
    /// True when the region fully covers the cell; false for boundary
    /// cells emitted at the detail level.
    pub covered: bool,
}

/// Recursive subdivision grid with a fixed maximum depth.
///
/// Eleven levels put leaf cells below 15 cm × 15 cm, comfortably past
/// the 7-decimal-place storage format.
#[derive(Debug, Clone)]
pub struct PrefixGrid {
    max_levels: usize,
}

impl PrefixGrid {
    /// Creates a grid bounded at `max_levels` characters of precision.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidPrecision`] unless `1..=12`.
    pub fn new(max_levels: usize) -> Result<Self, SpatialError> {
        if max_levels == 0 || max_levels > MAX_GRID_LEVELS {
            return Err(SpatialError::InvalidPrecision(max_levels));
        }
        Ok(Self { max_levels })
    }

    /// Maximum depth of this grid.
    #[must_use]
    pub const fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Ancestor token chain for a point, root to leaf.
    ///
    /// A point is a degenerate shape: exactly one token per level, each a
    /// prefix of the next.
    ///
    /// # Errors
    ///
    /// Returns an error when the coordinate is out of range.
    pub fn point_tokens(&self, point: Point<f64>) -> Result<Vec<String>, SpatialError> {
        region::validate_coordinate(point.x(), point.y())?;
        let leaf = geohash::encode(point.into(), self.max_levels)?;
        Ok((1..=self.max_levels).map(|len| leaf[..len].to_string()).collect())
    }

    /// Cells covering a circle, descending no deeper than `detail_level`.
    ///
    /// Queue-driven breadth-first descent: a disjoint cell prunes its
    /// subtree, a fully covered cell is emitted without descending (one
    /// token stands in for the whole subtree), and a boundary cell
    /// descends until the detail level, where it is emitted as a partial
    /// leaf.
    ///
    /// # Errors
    ///
    /// Propagates geohash decoding failures (unreachable for tokens this
    /// grid generates).
    pub fn covering(
        &self,
        circle: &Circle,
        detail_level: usize,
    ) -> Result<Vec<CellCover>, SpatialError> {
        let detail_level = detail_level.clamp(1, self.max_levels);
        let mut cells = Vec::new();
        let mut queue: VecDeque<String> =
            BASE32.iter().map(|&symbol| (symbol as char).to_string()).collect();

        while let Some(token) = queue.pop_front() {
            let bounds = geohash::decode_bbox(&token)?;
            match circle.relate_rect(&bounds) {
                SpatialRelation::Disjoint => {}
                SpatialRelation::Contains => cells.push(CellCover { token, covered: true }),
                SpatialRelation::Intersects => {
                    if token.len() >= detail_level {
                        cells.push(CellCover { token, covered: false });
                    } else {
                        for &symbol in BASE32 {
                            let mut child = String::with_capacity(token.len() + 1);
                            child.push_str(&token);
                            child.push(symbol as char);
                            queue.push_back(child);
                        }
                    }
                }
            }
        }

        log::trace!(
            "Covered circle (r={:.4}°) with {} cells at detail level {detail_level}",
            circle.radius_degrees(),
            cells.len()
        );
        Ok(cells)
    }

    /// Width and height of a cell at the given level, in degrees.
    ///
    /// Each character carries 5 bits, split alternately between longitude
    /// (first) and latitude.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_dimensions(level: usize) -> (f64, f64) {
        let bits = 5 * level;
        let lon_bits = bits.div_ceil(2);
        let lat_bits = bits / 2;
        let lon_span = 360.0 / (1_u64 << lon_bits) as f64;
        let lat_span = 180.0 / (1_u64 << lat_bits) as f64;
        (lon_span, lat_span)
    }

    /// Coarsest level whose cells are no larger than `degrees` in either
    /// dimension, clamped to the grid's maximum depth.
    #[must_use]
    pub fn level_for_distance(&self, degrees: f64) -> usize {
        if degrees <= 0.0 {
            return self.max_levels;
        }
        for level in 1..=self.max_levels {
            let (width, height) = Self::cell_dimensions(level);
            if width.max(height) <= degrees {
                return level;
            }
        }
        self.max_levels
    }
}
