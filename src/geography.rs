//! Geographic fields and freshwater placement.
//!
//! Elevation, dryness, and depth are normalized graph distances to terrain
//! sets: land slopes toward the sea and inland water, dryness grows away from
//! freshwater, depth grows away from shore. Lakes start from a shuffled band
//! of mid-high-elevation hexes and expand irregularly; each accepted lake must
//! drain to the ocean through a strictly downhill river, or it is discarded
//! without touching the grid.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::biomes::ClimateModifiers;
use crate::grid::HexGrid;
use crate::hex::{HexId, Terrain};

const FRESHWATER: [Terrain; 2] = [Terrain::Lake, Terrain::River];

/// Weight of ocean distance in the final elevation blend.
const ELEVATION_OCEAN_WEIGHT: f32 = 0.6;
/// Weight of freshwater distance in the dryness blend.
const DRYNESS_FRESHWATER_WEIGHT: f32 = 0.8;

/// Computes elevation/dryness/depth and places lakes and rivers.
pub struct GeographyLayer {
    min_lake_expansions: u32,
    max_lake_expansions: u32,
    lake_target: u32,
    made_lakes: u32,
    /// Mid-high-elevation hexes still eligible to seed a lake, pre-shuffled.
    lake_starters: Vec<HexId>,
    /// Hexes not yet consumed by freshwater, by arena index.
    usable: Vec<bool>,
    rng: ChaCha8Rng,
}

impl GeographyLayer {
    /// Seeds initial elevation (ocean distance only) and collects the band of
    /// candidate lake starters: roughly the top sixth by elevation.
    pub fn new(grid: &mut HexGrid, modifiers: &ClimateModifiers, mut rng: ChaCha8Rng) -> Self {
        let lake_target = rng.gen_range(modifiers.lake_count.0..=modifiers.lake_count.1);

        set_elevation(grid, false, 0);

        let mut by_elevation: Vec<HexId> = grid.iter().map(|h| h.id).collect();
        by_elevation.sort_by(|a, b| {
            grid.hex(*a).elevation.total_cmp(&grid.hex(*b).elevation).then(a.cmp(b))
        });
        let start = (by_elevation.len() as f64 / 1.2).round() as usize;
        let end = (start + start / 24).min(by_elevation.len());
        let mut lake_starters = by_elevation[start..end].to_vec();
        lake_starters.shuffle(&mut rng);

        Self {
            min_lake_expansions: modifiers.lake_expansions.0,
            max_lake_expansions: modifiers.lake_expansions.1,
            lake_target,
            made_lakes: 0,
            lake_starters,
            usable: grid.iter().map(|h| h.is_usable_land()).collect(),
            rng,
        }
    }

    pub fn made_lakes(&self) -> u32 {
        self.made_lakes
    }

    pub fn lake_target(&self) -> u32 {
        self.lake_target
    }

    /// One freshwater placement step: try the next lake candidate. Returns
    /// false once the target is reached or the candidate pool is exhausted.
    pub fn place_freshwater(&mut self, grid: &mut HexGrid) -> bool {
        if self.made_lakes >= self.lake_target || self.lake_starters.is_empty() {
            if self.made_lakes < self.lake_target {
                warn!(
                    made = self.made_lakes,
                    target = self.lake_target,
                    "lake candidate pool exhausted before target"
                );
            }
            return false;
        }

        grid.refresh_neighbor_counts();
        let Some(start) = self.lake_starters.pop() else {
            return false;
        };
        if !self.usable[start.index()] {
            return true;
        }

        if let Some((lake, mut exterior)) = self.expand_lake(grid, start) {
            // Most downhill headroom first: highest exterior hex leads.
            exterior.sort_by(|a, b| grid.hex(*a).elevation.total_cmp(&grid.hex(*b).elevation));
            while let Some(head) = exterior.pop() {
                let river = path_river(grid, head);
                if river.is_empty() {
                    continue;
                }
                for &id in &lake {
                    grid.hex_mut(id).set_terrain(Terrain::Lake);
                    self.usable[id.index()] = false;
                }
                for &id in &river {
                    grid.hex_mut(id).set_terrain(Terrain::River);
                    self.usable[id.index()] = false;
                }
                self.made_lakes += 1;
                debug!(lake_hexes = lake.len(), river_hexes = river.len(), "placed lake");
                break;
            }
        }
        true
    }

    /// Recompute all fields once freshwater placement has finished.
    pub fn finalize(&mut self, grid: &mut HexGrid) {
        grid.refresh_neighbor_counts();
        set_elevation(grid, true, self.made_lakes);
        set_dryness(grid, self.made_lakes);
        set_depth(grid);
        grid.refresh_neighbor_counts();
    }

    /// Expand a candidate lake a random number of rings from `start`, each
    /// ring continuing through a random subset of the newly added hexes so
    /// lakes are not perfect circles. Returns the lake hexes and its
    /// land-adjacent exterior, or None if the candidate touches ocean or an
    /// existing river (in which case the grid is left untouched).
    fn expand_lake(&mut self, grid: &HexGrid, start: HexId) -> Option<(Vec<HexId>, Vec<HexId>)> {
        let mut expansions = self.rng.gen_range(self.min_lake_expansions..=self.max_lake_expansions);
        let mut lake: Vec<HexId> = vec![start];
        let mut frontier: Vec<HexId> = vec![start];

        while expansions > 0 && !frontier.is_empty() {
            let mut ring: Vec<HexId> = Vec::new();
            for &id in &frontier {
                for &nid in &grid.hex(id).direct_neighbors {
                    if self.usable[nid.index()] && !lake.contains(&nid) && !ring.contains(&nid) {
                        ring.push(nid);
                    }
                }
            }
            if ring.is_empty() {
                break;
            }
            lake.extend_from_slice(&ring);
            expansions -= 1;
            let keep = (ring.len() as f32 * self.rng.gen_range(0.1..=1.0)) as usize;
            ring.truncate(keep);
            frontier = ring;
        }

        let mut exterior = Vec::new();
        for &id in &lake {
            let hex = grid.hex(id);
            if hex.direct_count(Terrain::Ocean) > 0 || hex.direct_count(Terrain::River) > 0 {
                return None;
            }
            if hex.direct_count(Terrain::Land) > 0 {
                exterior.push(id);
            }
        }
        Some((lake, exterior))
    }
}

/// Walk strictly downhill from `start`, always to the lowest-elevation direct
/// neighbor, until no lower neighbor exists. The path is a river only if it
/// ends beside the ocean; otherwise an empty path is returned.
fn path_river(grid: &HexGrid, start: HexId) -> Vec<HexId> {
    let mut river = Vec::new();
    let mut current = start;

    loop {
        river.push(current);
        let lowest = grid
            .hex(current)
            .direct_neighbors
            .iter()
            .copied()
            .min_by(|a, b| grid.hex(*a).elevation.total_cmp(&grid.hex(*b).elevation));
        match lowest {
            Some(next) if grid.hex(current).elevation > grid.hex(next).elevation => current = next,
            _ => break,
        }
    }

    match river.last() {
        Some(&mouth) if grid.hex(mouth).direct_count(Terrain::Ocean) > 0 => river,
        _ => Vec::new(),
    }
}

/// Elevation: distance to ocean for land and coast, blended 60/40 with
/// distance to freshwater once any exists. Water hexes sit at zero.
fn set_elevation(grid: &mut HexGrid, include_freshwater: bool, made_lakes: u32) {
    for id in grid.ids().collect::<Vec<_>>() {
        let elevation = if grid.hex(id).is_usable_land() {
            let ocean = grid.distance_to(id, &[Terrain::Ocean]);
            if include_freshwater && made_lakes > 0 {
                let freshwater = grid.distance_to(id, &FRESHWATER);
                ocean * ELEVATION_OCEAN_WEIGHT + freshwater * (1.0 - ELEVATION_OCEAN_WEIGHT)
            } else {
                ocean
            }
        } else {
            0.0
        };
        grid.hex_mut(id).elevation = elevation;
    }
}

/// Dryness: mostly distance to freshwater, minorly distance to ocean. With no
/// freshwater on the map the freshwater term saturates at the maximum.
fn set_dryness(grid: &mut HexGrid, made_lakes: u32) {
    for id in grid.ids().collect::<Vec<_>>() {
        let dryness = if grid.hex(id).is_usable_land() {
            let ocean = grid.distance_to(id, &[Terrain::Ocean]);
            let freshwater = if made_lakes > 0 {
                grid.distance_to(id, &FRESHWATER)
            } else {
                1.0
            };
            freshwater * DRYNESS_FRESHWATER_WEIGHT + ocean * (1.0 - DRYNESS_FRESHWATER_WEIGHT)
        } else {
            0.0
        };
        grid.hex_mut(id).dryness = dryness;
    }
}

/// Depth: distance to land for every water hex.
pub fn set_depth(grid: &mut HexGrid) {
    for id in grid.ids().collect::<Vec<_>>() {
        let hex = grid.hex(id);
        let depth = if hex.is_ocean() || hex.is_lake() || hex.is_river() {
            grid.distance_to(id, &[Terrain::Land])
        } else {
            0.0
        };
        grid.hex_mut(id).depth = depth;
    }
}
