//! Arena-backed hexagon grid with doubled-offset addressing.
//!
//! The grid owns every [`Hex`] for its full lifetime; neighbor relationships
//! are arena indices rather than references. Cells exist only at offsets where
//! `x + y` is even, and out-of-bounds access is a silent no-op rather than an
//! error: algorithms walking neighbor tables simply see an absent neighbor at
//! the map edge.

use std::collections::VecDeque;

use crate::hex::{Hex, HexId, Terrain};

/// Metric used when converting a BFS hit into a scalar distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

/// Pixel-space layout of a hex cell, shared by every cell in a grid.
#[derive(Clone, Copy, Debug)]
pub struct HexLayout {
    pub hex_size: i32,
    pub pointy: bool,
    pub width_diameter: i32,
    pub height_diameter: i32,
    pub horizontal_spacing: i32,
    pub vertical_spacing: i32,
}

impl HexLayout {
    pub fn new(hex_size: u32, pointy: bool) -> Self {
        let size = hex_size as f64;
        let width_diameter = if pointy { 3.0_f64.sqrt() * size } else { 2.0 * size };
        let height_diameter = if pointy { 2.0 * size } else { 3.0_f64.sqrt() * size };
        let vertical_spacing = if pointy { height_diameter * 0.75 } else { height_diameter / 2.0 };
        let horizontal_spacing = if pointy { width_diameter / 2.0 } else { width_diameter * 0.75 };

        Self {
            hex_size: hex_size as i32,
            pointy,
            width_diameter: width_diameter as i32,
            height_diameter: height_diameter as i32,
            horizontal_spacing: horizontal_spacing as i32,
            vertical_spacing: vertical_spacing as i32,
        }
    }

    /// The six corner vertices of a hex centered at `(cx, cy)`, in winding
    /// order. Pointy-top corners start 30 degrees off the flat-top angles.
    pub fn corners(&self, cx: i32, cy: i32) -> [(i32, i32); 6] {
        let mut vertices = [(0, 0); 6];
        for (i, v) in vertices.iter_mut().enumerate() {
            let mut angle_deg = 60.0 * i as f64;
            if self.pointy {
                angle_deg -= 30.0;
            }
            let angle_rad = angle_deg.to_radians();
            *v = (
                cx + (self.hex_size as f64 * angle_rad.cos()) as i32,
                cy + (self.hex_size as f64 * angle_rad.sin()) as i32,
            );
        }
        vertices
    }
}

const DIRECT_POINTY: [(i32, i32); 6] = [(1, 1), (-1, -1), (1, -1), (-1, 1), (2, 0), (-2, 0)];
const SECONDARY_POINTY: [(i32, i32); 6] = [(0, 2), (0, -2), (3, 1), (-3, 1), (-3, -1), (3, -1)];
const DIRECT_FLAT: [(i32, i32); 6] = [(1, 1), (-1, -1), (1, -1), (-1, 1), (0, 2), (0, -2)];
const SECONDARY_FLAT: [(i32, i32); 6] = [(2, 0), (-2, 0), (1, 3), (-1, 3), (1, -3), (-1, -3)];

const EMPTY: u32 = u32::MAX;

/// The 2D hex arena plus its neighbor topology.
pub struct HexGrid {
    columns: usize,
    rows: usize,
    cells: Vec<Hex>,
    /// Dense offset -> arena index table, `EMPTY` where no cell is allocated.
    lookup: Vec<u32>,
    pub layout: HexLayout,
    pub actual_width: i32,
    pub actual_height: i32,
    max_distance: f32,
    metric: DistanceMetric,
}

impl HexGrid {
    /// Build a grid sized to a target pixel width. The pixel height follows
    /// the width at a fixed sqrt(1/3) aspect; flat-top orientation swaps the
    /// row/column counts along with the neighbor tables.
    pub fn new(pixel_width: u32, hex_size: u32, pointy: bool, metric: DistanceMetric) -> Self {
        let pixel_height = ((1.0_f64 / 3.0).sqrt() * pixel_width as f64).round();
        let layout = HexLayout::new(hex_size, pointy);

        let mut columns = (pixel_width as f64 / (layout.width_diameter as f64 / 2.0)) as usize;
        let mut rows = (pixel_height / (layout.height_diameter as f64 / 2.0)) as usize;
        if !pointy {
            std::mem::swap(&mut columns, &mut rows);
        }

        Self::with_dimensions(columns, rows, hex_size, pointy, metric)
    }

    /// Build a grid with explicit column/row counts. `new` delegates here;
    /// tests use it to craft exact shapes.
    pub fn with_dimensions(
        columns: usize,
        rows: usize,
        hex_size: u32,
        pointy: bool,
        metric: DistanceMetric,
    ) -> Self {
        let layout = HexLayout::new(hex_size, pointy);
        let mut grid = Self {
            columns,
            rows,
            cells: Vec::new(),
            lookup: vec![EMPTY; columns * rows],
            layout,
            actual_width: (layout.horizontal_spacing as f64 / 2.0
                + layout.horizontal_spacing as f64 * columns as f64)
                .round() as i32,
            actual_height: (layout.vertical_spacing as f64
                + layout.vertical_spacing as f64 * rows as f64)
                .round() as i32,
            max_distance: (columns * rows) as f32 / 200.0,
            metric,
        };

        // Allocate cells at every even-sum offset, in scan order.
        for x in 0..columns as i32 {
            for y in 0..rows as i32 {
                if (x + y) % 2 != 0 {
                    continue;
                }
                let id = HexId(grid.cells.len() as u32);
                let mut hex = Hex::new(id, x, y);
                hex.center = (
                    layout.width_diameter / 2 + x * layout.horizontal_spacing,
                    layout.height_diameter / 2 + y * layout.vertical_spacing,
                );
                hex.vertices = layout.corners(hex.center.0, hex.center.1);
                grid.lookup[x as usize * rows + y as usize] = id.0;
                grid.cells.push(hex);
            }
        }

        let (direct, secondary) = if pointy {
            (DIRECT_POINTY, SECONDARY_POINTY)
        } else {
            (DIRECT_FLAT, SECONDARY_FLAT)
        };

        // Neighbor tables are resolved once, after every cell exists.
        for i in 0..grid.cells.len() {
            let (x, y) = (grid.cells[i].x, grid.cells[i].y);
            let direct_ids: Vec<HexId> =
                direct.iter().filter_map(|&(dx, dy)| grid.get(x + dx, y + dy)).collect();
            let secondary_ids: Vec<HexId> =
                secondary.iter().filter_map(|&(dx, dy)| grid.get(x + dx, y + dy)).collect();
            grid.cells[i].direct_neighbors = direct_ids;
            grid.cells[i].secondary_neighbors = secondary_ids;
        }

        grid
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Arena id at a doubled-offset coordinate, `None` off-grid or at an
    /// unallocated (odd-sum) offset.
    pub fn get(&self, x: i32, y: i32) -> Option<HexId> {
        if x < 0 || y < 0 || x as usize >= self.columns || y as usize >= self.rows {
            return None;
        }
        let raw = self.lookup[x as usize * self.rows + y as usize];
        (raw != EMPTY).then_some(HexId(raw))
    }

    pub fn hex(&self, id: HexId) -> &Hex {
        &self.cells[id.index()]
    }

    pub fn hex_mut(&mut self, id: HexId) -> &mut Hex {
        &mut self.cells[id.index()]
    }

    /// Set the terrain at a coordinate; silently does nothing out of bounds.
    pub fn set_terrain_at(&mut self, x: i32, y: i32, terrain: Terrain) {
        if let Some(id) = self.get(x, y) {
            self.cells[id.index()].set_terrain(terrain);
        }
    }

    /// Deterministic iteration over all allocated cells, in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Hex> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hex> {
        self.cells.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = HexId> + '_ {
        (0..self.cells.len() as u32).map(HexId)
    }

    /// Recompute every cell's neighbor-state histograms. Histograms are valid
    /// only until the next terrain mutation.
    pub fn refresh_neighbor_counts(&mut self) {
        for i in 0..self.cells.len() {
            let mut direct = [0u8; crate::hex::TERRAIN_STATES];
            for n in 0..self.cells[i].direct_neighbors.len() {
                let nid = self.cells[i].direct_neighbors[n];
                direct[self.cells[nid.index()].terrain().index()] += 1;
            }
            let mut secondary = [0u8; crate::hex::TERRAIN_STATES];
            for n in 0..self.cells[i].secondary_neighbors.len() {
                let nid = self.cells[i].secondary_neighbors[n];
                secondary[self.cells[nid.index()].terrain().index()] += 1;
            }
            let cell = &mut self.cells[i];
            cell.direct = direct;
            cell.secondary = secondary;
            for s in 0..crate::hex::TERRAIN_STATES {
                cell.total[s] = direct[s] + secondary[s];
            }
        }
    }

    /// BFS ring by ring over direct neighbors from `origin` until a hex whose
    /// terrain is in `targets` is found.
    pub fn expand_until_hit(&self, origin: HexId, targets: &[Terrain]) -> Option<HexId> {
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        seen[origin.index()] = true;
        queue.push_back(origin);

        while let Some(id) = queue.pop_front() {
            for &nid in &self.cells[id.index()].direct_neighbors {
                if targets.contains(&self.cells[nid.index()].terrain()) {
                    return Some(nid);
                }
                if !seen[nid.index()] {
                    seen[nid.index()] = true;
                    queue.push_back(nid);
                }
            }
        }
        None
    }

    /// Normalized distance from `origin` to the nearest hex in one of the
    /// target states, clamped to `[0, 1]`. Returns 1.0 when no target exists.
    pub fn distance_to(&self, origin: HexId, targets: &[Terrain]) -> f32 {
        let Some(end) = self.expand_until_hit(origin, targets) else {
            return 1.0;
        };

        let dx = (self.cells[origin.index()].x - self.cells[end.index()].x) as f32;
        let dy = (self.cells[origin.index()].y - self.cells[end.index()].y) as f32;
        let distance = match self.metric {
            DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
            DistanceMetric::Manhattan => dx.abs() + dy.abs(),
            DistanceMetric::Chebyshev => dx.abs().max(dy.abs()),
        };

        self.normalize(distance)
    }

    pub fn normalize(&self, value: f32) -> f32 {
        (value / self.max_distance).clamp(0.0, 1.0)
    }
}
