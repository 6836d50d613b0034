//! Island discovery: maximal connected components of land hexes.
//!
//! Discovery is incremental so a caller can step it for visualization or drive
//! it to completion. One island grows at a time, one BFS ring per step; when a
//! ring adds nothing the island is sealed and the next unclaimed land hex
//! seeds a new one. Undersized islands are dissolved back into ocean rather
//! than merged, unlike undersized regions.

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::grid::HexGrid;
use crate::hex::{HexId, IslandId, RegionId, Terrain};
use crate::shape::{self, Outline};

/// A maximal connected component of land hexes.
#[derive(Clone, Debug)]
pub struct Island {
    pub id: IslandId,
    pub hexes: Vec<HexId>,
    /// Regions carved out of this island, filled in by the region layer.
    pub region_ids: std::collections::BTreeSet<RegionId>,
    /// Hexes added by the most recent expansion ring.
    frontier: Vec<HexId>,
    can_expand: bool,
}

impl Island {
    fn new(id: IslandId, start: HexId, grid: &mut HexGrid) -> Self {
        grid.hex_mut(start).island = Some(id);
        Self {
            id,
            hexes: vec![start],
            region_ids: std::collections::BTreeSet::new(),
            frontier: vec![start],
            can_expand: true,
        }
    }

    /// Grow outward by one BFS ring over unclaimed land neighbors.
    fn expand(&mut self, grid: &mut HexGrid) {
        let mut ring: Vec<HexId> = Vec::new();
        for &id in &self.frontier {
            for &nid in &grid.hex(id).direct_neighbors {
                let neighbor = grid.hex(nid);
                if neighbor.is_land() && neighbor.island.is_none() && !ring.contains(&nid) {
                    ring.push(nid);
                }
            }
        }

        if ring.is_empty() {
            self.can_expand = false;
            return;
        }
        for &id in &ring {
            grid.hex_mut(id).island = Some(self.id);
            self.hexes.push(id);
        }
        self.frontier = ring;
    }

    /// Union polygon of the member hexes; recomputed on call.
    pub fn outline(&self, grid: &HexGrid) -> Outline {
        shape::outline_of(grid, &self.hexes)
    }
}

/// Incremental flood-fill partition of land into islands.
pub struct IslandLayer {
    islands: BTreeMap<IslandId, Island>,
    usable: Vec<HexId>,
    current: Option<IslandId>,
    min_island_size: usize,
    next_id: u32,
    rng: ChaCha8Rng,
}

impl IslandLayer {
    pub fn new(grid: &HexGrid, min_island_size: usize, rng: ChaCha8Rng) -> Self {
        let usable: Vec<HexId> = grid.iter().filter(|h| h.is_land()).map(|h| h.id).collect();
        Self {
            islands: BTreeMap::new(),
            usable,
            current: None,
            min_island_size,
            next_id: 0,
            rng,
        }
    }

    /// One discovery step. Returns false once no unclaimed land remains.
    pub fn discover(&mut self, grid: &mut HexGrid) -> bool {
        if let Some(id) = self.current {
            let island = self.islands.get_mut(&id).expect("current island exists");
            if island.can_expand {
                island.expand(grid);
            } else {
                self.current = None;
            }
            return true;
        }

        while !self.usable.is_empty() {
            let pick = self.rng.gen_range(0..self.usable.len());
            let start = self.usable.swap_remove(pick);
            if grid.hex(start).island.is_some() {
                continue;
            }
            let id = IslandId(self.next_id);
            self.next_id += 1;
            self.islands.insert(id, Island::new(id, start, grid));
            self.current = Some(id);
            return true;
        }
        false
    }

    /// Dissolve islands under the minimum size: their hexes revert to ocean
    /// and lose membership.
    pub fn clean_up(&mut self, grid: &mut HexGrid) {
        let doomed: Vec<IslandId> = self
            .islands
            .values()
            .filter(|i| i.hexes.len() < self.min_island_size)
            .map(|i| i.id)
            .collect();
        for id in doomed {
            let island = self.islands.remove(&id).expect("island queued for removal");
            debug!(island = id.0, hexes = island.hexes.len(), "dissolving undersized island");
            for hid in island.hexes {
                let hex = grid.hex_mut(hid);
                hex.set_terrain(Terrain::Ocean);
                hex.island = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    pub fn get(&self, id: IslandId) -> Option<&Island> {
        self.islands.get(&id)
    }

    pub fn get_mut(&mut self, id: IslandId) -> Option<&mut Island> {
        self.islands.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Island> {
        self.islands.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DistanceMetric;
    use rand::SeedableRng;

    fn grid_with_two_islands() -> HexGrid {
        let mut g = HexGrid::with_dimensions(20, 16, 10, true, DistanceMetric::Euclidean);
        // Left blob: 3x3 even-sum block around (4, 4).
        for (x, y) in [(4, 4), (5, 5), (3, 5), (5, 3), (3, 3), (6, 4), (2, 4)] {
            let id = g.get(x, y).unwrap();
            g.hex_mut(id).set_terrain(Terrain::Land);
        }
        // Right blob, well separated.
        for (x, y) in [(14, 8), (15, 9), (13, 9), (15, 7), (13, 7)] {
            let id = g.get(x, y).unwrap();
            g.hex_mut(id).set_terrain(Terrain::Land);
        }
        g
    }

    fn run_discovery(grid: &mut HexGrid, min_size: usize) -> IslandLayer {
        let mut layer = IslandLayer::new(grid, min_size, ChaCha8Rng::seed_from_u64(5));
        while layer.discover(grid) {}
        layer
    }

    #[test]
    fn test_separate_blobs_become_separate_islands() {
        let mut g = grid_with_two_islands();
        let layer = run_discovery(&mut g, 1);
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn test_every_land_hex_is_claimed() {
        let mut g = grid_with_two_islands();
        let _layer = run_discovery(&mut g, 1);
        for h in g.iter() {
            if h.is_land() {
                assert!(h.island.is_some());
            } else {
                assert!(h.island.is_none());
            }
        }
    }

    #[test]
    fn test_islands_are_connected() {
        let mut g = grid_with_two_islands();
        let layer = run_discovery(&mut g, 1);
        for island in layer.iter() {
            // BFS within the island's own hex set must reach every member.
            let members: std::collections::BTreeSet<HexId> =
                island.hexes.iter().copied().collect();
            let mut seen = std::collections::BTreeSet::new();
            let mut queue = vec![island.hexes[0]];
            seen.insert(island.hexes[0]);
            while let Some(id) = queue.pop() {
                for &nid in &g.hex(id).direct_neighbors {
                    if members.contains(&nid) && seen.insert(nid) {
                        queue.push(nid);
                    }
                }
            }
            assert_eq!(seen, members);
        }
    }

    #[test]
    fn test_clean_up_dissolves_small_islands() {
        let mut g = grid_with_two_islands();
        let mut layer = run_discovery(&mut g, 6);
        layer.clean_up(&mut g);
        // Only the 7-hex blob survives a minimum size of 6.
        assert_eq!(layer.len(), 1);
        for h in g.iter() {
            if h.is_land() {
                assert!(h.island.is_some());
            }
        }
        let survivor = layer.iter().next().unwrap();
        assert!(survivor.hexes.len() >= 6);
        // Dissolved hexes reverted to ocean.
        let dissolved = g.get(14, 8).unwrap();
        assert!(g.hex(dissolved).is_ocean());
        assert!(g.hex(dissolved).island.is_none());
    }
}
