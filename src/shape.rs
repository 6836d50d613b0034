//! Polygon shapes for islands and regions.
//!
//! Islands and regions expose a single outline polygon, its area, and its
//! centroid, all computed by unioning the member hexagons through the `geo`
//! crate. The union runs pairwise over a work list, merging neighbors until a
//! single multi-polygon remains.

use geo::{Area, BooleanOps, Centroid, LineString, MultiPolygon, Polygon};

use crate::grid::HexGrid;
use crate::hex::HexId;

/// Computed outline of a hex group.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Outline {
    /// Exterior vertices of the largest unioned polygon, in winding order.
    pub vertices: Vec<(i32, i32)>,
    pub area: f64,
    pub centroid: (i32, i32),
}

/// Union the given hexes into one outline. Empty input yields a default
/// (empty) outline.
pub fn outline_of(grid: &HexGrid, hexes: &[HexId]) -> Outline {
    let polygons: Vec<MultiPolygon<f64>> = hexes
        .iter()
        .map(|&id| MultiPolygon::new(vec![hex_polygon(grid, id)]))
        .collect();

    let Some(unioned) = union_all(polygons) else {
        return Outline::default();
    };

    let area = unioned.unsigned_area();
    let centroid = unioned
        .centroid()
        .map(|p| (p.x().round() as i32, p.y().round() as i32))
        .unwrap_or((0, 0));

    // Disconnected groups shouldn't occur, but if the union produced several
    // polygons, report the exterior of the largest.
    let vertices = unioned
        .iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .map(|p| {
            p.exterior()
                .coords()
                .map(|c| (c.x.round() as i32, c.y.round() as i32))
                .collect()
        })
        .unwrap_or_default();

    Outline { vertices, area, centroid }
}

fn hex_polygon(grid: &HexGrid, id: HexId) -> Polygon<f64> {
    let hex = grid.hex(id);
    let ring: Vec<(f64, f64)> =
        hex.vertices.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Pairwise balanced union, O(n log n) union calls instead of a linear fold.
fn union_all(mut polygons: Vec<MultiPolygon<f64>>) -> Option<MultiPolygon<f64>> {
    if polygons.is_empty() {
        return None;
    }
    while polygons.len() > 1 {
        let mut merged = Vec::with_capacity(polygons.len() / 2 + 1);
        let mut iter = polygons.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => merged.push(a.union(&b)),
                None => merged.push(a),
            }
        }
        polygons = merged;
    }
    polygons.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DistanceMetric;

    fn grid() -> HexGrid {
        HexGrid::with_dimensions(10, 10, 20, true, DistanceMetric::Euclidean)
    }

    #[test]
    fn test_empty_group_yields_empty_outline() {
        let g = grid();
        let outline = outline_of(&g, &[]);
        assert!(outline.vertices.is_empty());
        assert_eq!(outline.area, 0.0);
    }

    #[test]
    fn test_single_hex_outline_matches_cell() {
        let g = grid();
        let id = g.get(4, 4).unwrap();
        let outline = outline_of(&g, &[id]);
        assert!(outline.area > 0.0);
        // A lone hexagon keeps six corners (plus ring closure).
        assert!(outline.vertices.len() >= 6);
        let hex = g.hex(id);
        assert!((outline.centroid.0 - hex.center.0).abs() <= 2);
        assert!((outline.centroid.1 - hex.center.1).abs() <= 2);
    }

    #[test]
    fn test_adjacent_hexes_union_grows_area() {
        let g = grid();
        let a = g.get(4, 4).unwrap();
        let b = g.hex(a).direct_neighbors[0];
        let single = outline_of(&g, &[a]);
        let pair = outline_of(&g, &[a, b]);
        assert!(pair.area > single.area);
        assert!(pair.area < single.area * 2.5);
    }
}
