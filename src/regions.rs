//! Political regions: bounded random growth over island land, merge repair,
//! and biome assignment.
//!
//! Region discovery reuses the island flood-fill shape but caps each region
//! with a random expansion budget, which is what yields several regions per
//! island. Undersized regions are absorbed into their smallest neighbor;
//! regions that stay tiny after merging are stripped back to water.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::biomes::{self, Biome, ClimateModifiers};
use crate::grid::HexGrid;
use crate::hex::{HexId, IslandId, RegionId, Terrain};
use crate::islands::IslandLayer;
use crate::shape::{self, Outline};

/// Regions smaller than this after merging are stripped back to water.
const STRAY_REGION_FLOOR: usize = 5;
/// A stripped hex becomes a lake when more than this many direct neighbors
/// are freshwater, otherwise ocean.
const LAKE_ADJACENCY_THRESHOLD: u8 = 5;

/// A political subdivision of an island.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub island_id: IslandId,
    pub hexes: BTreeSet<HexId>,

    pub exterior_hexes: BTreeSet<HexId>,
    pub coast_hexes: BTreeSet<HexId>,
    pub neighbor_region_ids: BTreeSet<RegionId>,

    pub is_coastal: bool,
    pub is_secluded: bool,
    pub is_surrounded: bool,
    pub near_lake: bool,
    pub near_river: bool,

    pub avg_elevation: f32,
    pub avg_dryness: f32,
    pub biome: Biome,
    pub base_color: [u8; 3],

    frontier: Vec<HexId>,
    expansions_left: u32,
    can_expand: bool,
}

impl Region {
    fn new(id: RegionId, island_id: IslandId, start: HexId, expansions: u32, grid: &mut HexGrid) -> Self {
        grid.hex_mut(start).region = Some(id);
        Self {
            id,
            island_id,
            hexes: BTreeSet::from([start]),
            exterior_hexes: BTreeSet::new(),
            coast_hexes: BTreeSet::new(),
            neighbor_region_ids: BTreeSet::new(),
            is_coastal: false,
            is_secluded: false,
            is_surrounded: false,
            near_lake: false,
            near_river: false,
            avg_elevation: 0.0,
            avg_dryness: 0.0,
            biome: Biome::Bare,
            base_color: Biome::Bare.base_color(),
            frontier: vec![start],
            expansions_left: expansions,
            can_expand: true,
        }
    }

    fn can_expand(&self) -> bool {
        self.can_expand && self.expansions_left > 0
    }

    /// Claim one BFS ring of unclaimed land, spending one expansion.
    fn expand(&mut self, grid: &mut HexGrid) {
        let mut ring: Vec<HexId> = Vec::new();
        for &id in &self.frontier {
            for &nid in &grid.hex(id).direct_neighbors {
                let neighbor = grid.hex(nid);
                if neighbor.is_land() && neighbor.region.is_none() && !ring.contains(&nid) {
                    ring.push(nid);
                }
            }
        }

        if ring.is_empty() {
            self.can_expand = false;
            return;
        }
        self.expansions_left -= 1;
        for &id in &ring {
            grid.hex_mut(id).region = Some(self.id);
            self.hexes.insert(id);
        }
        self.frontier = ring;
    }

    fn absorb(&mut self, other_hexes: &BTreeSet<HexId>, grid: &mut HexGrid) {
        for &id in other_hexes {
            grid.hex_mut(id).region = Some(self.id);
            self.hexes.insert(id);
        }
    }

    /// Exterior perimeter, ocean-facing coast hexes (reclassified Coast), and
    /// neighboring region ids. Requires fresh neighbor histograms.
    fn set_exterior_details(&mut self, grid: &mut HexGrid) {
        self.exterior_hexes.clear();
        self.coast_hexes.clear();
        self.neighbor_region_ids.clear();

        let members: Vec<HexId> = self.hexes.iter().copied().collect();
        for id in members {
            let neighbors: Vec<HexId> = grid.hex(id).direct_neighbors.clone();
            for nid in neighbors {
                let neighbor = grid.hex(nid);
                if neighbor.region == Some(self.id) {
                    continue;
                }
                if let Some(other) = neighbor.region {
                    self.neighbor_region_ids.insert(other);
                }
                if neighbor.is_ocean() {
                    grid.hex_mut(id).set_terrain(Terrain::Coast);
                    self.coast_hexes.insert(id);
                }
                self.exterior_hexes.insert(id);
            }
        }
    }

    /// Averages, adjacency flags, and the biome for this region. Requires
    /// fresh neighbor histograms.
    fn set_geographic_details(&mut self, grid: &HexGrid, modifiers: &ClimateModifiers) {
        self.is_coastal = false;
        self.near_lake = false;
        self.near_river = false;

        let mut elevation_sum = 0.0;
        let mut dryness_sum = 0.0;
        for &id in &self.hexes {
            let hex = grid.hex(id);
            elevation_sum += hex.elevation;
            dryness_sum += hex.dryness;
            if hex.direct_count(Terrain::Ocean) > 0 {
                self.is_coastal = true;
            }
            if hex.direct_count(Terrain::Lake) > 0 {
                self.near_lake = true;
            }
            if hex.direct_count(Terrain::River) > 0 {
                self.near_river = true;
            }
        }

        self.is_secluded = self.neighbor_region_ids.is_empty();
        self.is_surrounded = !self.is_coastal && !self.is_secluded;

        let count = self.hexes.len().max(1) as f32;
        self.avg_elevation =
            (elevation_sum / count + modifiers.elevation_offset).clamp(0.0, 1.0);
        self.avg_dryness = (dryness_sum / count + modifiers.dryness_offset).clamp(0.0, 1.0);

        self.biome = biomes::pick_biome(self.avg_elevation, self.avg_dryness);
        self.base_color = self.biome.base_color();
    }

    /// Union polygon of the member hexes; recomputed on call.
    pub fn outline(&self, grid: &HexGrid) -> Outline {
        let members: Vec<HexId> = self.hexes.iter().copied().collect();
        shape::outline_of(grid, &members)
    }
}

/// Grows, repairs, and classifies the political regions of a map.
pub struct RegionLayer {
    regions: BTreeMap<RegionId, Region>,
    usable: Vec<HexId>,
    current: Option<RegionId>,
    merge_queue: Vec<RegionId>,
    min_region_size: usize,
    min_expansions: u32,
    max_expansions: u32,
    modifiers: ClimateModifiers,
    next_id: u32,
    rng: ChaCha8Rng,
}

impl RegionLayer {
    pub fn new(
        grid: &HexGrid,
        islands: &IslandLayer,
        min_region_expansions: u32,
        max_region_expansions: u32,
        min_region_size_pct: f32,
        modifiers: ClimateModifiers,
        rng: ChaCha8Rng,
    ) -> Self {
        let mut usable: Vec<HexId> = Vec::new();
        for island in islands.iter() {
            usable.extend(island.hexes.iter().filter(|&&id| grid.hex(id).is_land()));
        }

        Self {
            regions: BTreeMap::new(),
            usable,
            current: None,
            merge_queue: Vec::new(),
            min_region_size: (min_region_size_pct * grid.len() as f32) as usize,
            min_expansions: min_region_expansions,
            max_expansions: max_region_expansions,
            modifiers,
            next_id: 0,
            rng,
        }
    }

    /// One discovery step: grow the active region a ring, or seed a new one.
    /// Returns false once no unclaimed land remains.
    pub fn discover(&mut self, grid: &mut HexGrid, islands: &mut IslandLayer) -> bool {
        if let Some(id) = self.current {
            let region = self.regions.get_mut(&id).expect("current region exists");
            if region.can_expand() {
                region.expand(grid);
            } else {
                self.current = None;
            }
            return true;
        }

        while !self.usable.is_empty() {
            let pick = self.rng.gen_range(0..self.usable.len());
            let start = self.usable.swap_remove(pick);
            let hex = grid.hex(start);
            if hex.region.is_some() {
                continue;
            }
            let island_id = hex.island.expect("region discovery runs on island land");
            let id = RegionId(self.next_id);
            self.next_id += 1;
            let budget = self.rng.gen_range(self.min_expansions..=self.max_expansions);
            self.regions.insert(id, Region::new(id, island_id, start, budget, grid));
            if let Some(island) = islands.get_mut(island_id) {
                island.region_ids.insert(id);
            }
            self.current = Some(id);
            return true;
        }
        false
    }

    /// Queue every region strictly below the minimum size for merging.
    pub fn establish_merge_queue(&mut self) {
        self.merge_queue = self
            .regions
            .values()
            .filter(|r| r.hexes.len() < self.min_region_size)
            .map(|r| r.id)
            .collect();
    }

    /// Merge one queued region into its smallest neighbor. Returns false when
    /// the queue is empty. Isolated regions are left for stray removal.
    pub fn merge(&mut self, grid: &mut HexGrid, islands: &mut IslandLayer) -> bool {
        let Some(id) = self.merge_queue.pop() else {
            return false;
        };
        self.refresh_details(grid);

        let Some(region) = self.regions.get(&id) else {
            return true;
        };
        let target = region
            .neighbor_region_ids
            .iter()
            .filter_map(|nid| self.regions.get(nid))
            .min_by_key(|r| (r.hexes.len(), r.id))
            .map(|r| r.id);

        if let Some(target_id) = target {
            let doomed = self.regions.remove(&id).expect("region checked present");
            debug!(region = id.0, into = target_id.0, hexes = doomed.hexes.len(), "merging region");
            let target = self.regions.get_mut(&target_id).expect("merge target exists");
            target.absorb(&doomed.hexes, grid);
            if let Some(island) = islands.get_mut(doomed.island_id) {
                island.region_ids.remove(&id);
            }
            self.refresh_details(grid);
        }
        true
    }

    /// Strip regions still under the absolute floor after merging: their
    /// hexes lose island and region membership and become lake or ocean, and
    /// depth is recomputed for the new water.
    pub fn remove_stray_regions(&mut self, grid: &mut HexGrid, islands: &mut IslandLayer) {
        let doomed: Vec<RegionId> = self
            .regions
            .values()
            .filter(|r| r.hexes.len() < STRAY_REGION_FLOOR)
            .map(|r| r.id)
            .collect();

        grid.refresh_neighbor_counts();
        let mut new_water: Vec<HexId> = Vec::new();
        for id in doomed {
            let region = self.regions.remove(&id).expect("region queued for removal");
            debug!(region = id.0, hexes = region.hexes.len(), "stripping stray region");
            if let Some(island) = islands.get_mut(region.island_id) {
                island.region_ids.remove(&id);
            }
            for &hid in &region.hexes {
                let hex = grid.hex_mut(hid);
                hex.island = None;
                hex.region = None;
                new_water.push(hid);
            }
        }

        for &hid in &new_water {
            let hex = grid.hex(hid);
            let freshwater =
                hex.direct_count(Terrain::Lake) + hex.direct_count(Terrain::River);
            let terrain = if freshwater > LAKE_ADJACENCY_THRESHOLD {
                Terrain::Lake
            } else {
                Terrain::Ocean
            };
            let hex = grid.hex_mut(hid);
            hex.set_terrain(terrain);
            hex.elevation = 0.0;
            hex.dryness = 0.0;
        }
        for &hid in &new_water {
            let depth = grid.distance_to(hid, &[Terrain::Land, Terrain::Coast]);
            grid.hex_mut(hid).depth = depth;
        }
    }

    /// Recompute exterior and geographic details for every region.
    pub fn refresh_details(&mut self, grid: &mut HexGrid) {
        grid.refresh_neighbor_counts();
        let ids: Vec<RegionId> = self.regions.keys().copied().collect();
        for id in &ids {
            if let Some(mut region) = self.regions.remove(id) {
                region.set_exterior_details(grid);
                self.regions.insert(*id, region);
            }
        }
        grid.refresh_neighbor_counts();
        for region in self.regions.values_mut() {
            region.set_geographic_details(grid, &self.modifiers);
        }
    }

    pub fn min_region_size(&self) -> usize {
        self.min_region_size
    }

    pub fn merge_queue_len(&self) -> usize {
        self.merge_queue.len()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{climate_modifiers, Humidity, Temperature};
    use crate::grid::DistanceMetric;
    use rand::SeedableRng;

    fn island_world() -> (HexGrid, IslandLayer) {
        let mut g = HexGrid::with_dimensions(30, 24, 10, true, DistanceMetric::Euclidean);
        let cols = g.columns() as i32;
        let rows = g.rows() as i32;
        for h in g.iter_mut() {
            if h.x <= 1 || h.y <= 1 || h.x >= cols - 2 || h.y >= rows - 2 {
                h.set_terrain(Terrain::Ocean);
            } else {
                h.set_terrain(Terrain::Land);
            }
        }
        let mut islands = IslandLayer::new(&g, 1, ChaCha8Rng::seed_from_u64(2));
        while islands.discover(&mut g) {}
        islands.clean_up(&mut g);
        (g, islands)
    }

    fn modifiers() -> ClimateModifiers {
        climate_modifiers(Temperature::Temperate, Humidity::Average)
    }

    fn grown_layer(
        grid: &mut HexGrid,
        islands: &mut IslandLayer,
        min_size_pct: f32,
    ) -> RegionLayer {
        let mut layer = RegionLayer::new(
            grid,
            islands,
            1,
            3,
            min_size_pct,
            modifiers(),
            ChaCha8Rng::seed_from_u64(8),
        );
        while layer.discover(grid, islands) {}
        layer
    }

    #[test]
    fn test_discovery_claims_all_island_land() {
        let (mut g, mut islands) = island_world();
        let layer = grown_layer(&mut g, &mut islands, 0.0);
        assert!(layer.len() > 1, "bounded budgets should split the island");
        for h in g.iter() {
            if h.is_land() {
                assert!(h.region.is_some());
            }
        }
    }

    #[test]
    fn test_regions_are_registered_with_their_island() {
        let (mut g, mut islands) = island_world();
        let layer = grown_layer(&mut g, &mut islands, 0.0);
        for region in layer.iter() {
            let island = islands.get(region.island_id).expect("island exists");
            assert!(island.region_ids.contains(&region.id));
        }
    }

    #[test]
    fn test_merge_queue_threshold_is_strict() {
        let (mut g, mut islands) = island_world();
        let mut layer = grown_layer(&mut g, &mut islands, 0.0);

        // Pick the boundary so one region sits exactly at the threshold.
        let sizes: Vec<usize> = layer.iter().map(|r| r.hexes.len()).collect();
        let boundary = *sizes.iter().min().unwrap();
        layer.min_region_size = boundary;
        layer.establish_merge_queue();
        // Regions exactly at the threshold are not queued.
        for id in &layer.merge_queue {
            assert!(layer.get(*id).unwrap().hexes.len() < boundary);
        }

        layer.min_region_size = boundary + 1;
        layer.establish_merge_queue();
        assert!(layer
            .merge_queue
            .iter()
            .any(|id| layer.get(*id).unwrap().hexes.len() == boundary));
    }

    #[test]
    fn test_merged_regions_stay_connected() {
        let (mut g, mut islands) = island_world();
        let mut layer = grown_layer(&mut g, &mut islands, 0.05);
        layer.establish_merge_queue();
        while layer.merge(&mut g, &mut islands) {}

        for region in layer.iter() {
            let members = &region.hexes;
            let first = *members.iter().next().unwrap();
            let mut seen = BTreeSet::from([first]);
            let mut queue = vec![first];
            while let Some(id) = queue.pop() {
                for &nid in &g.hex(id).direct_neighbors {
                    if members.contains(&nid) && seen.insert(nid) {
                        queue.push(nid);
                    }
                }
            }
            assert_eq!(&seen, members, "region {} fragmented", region.id.0);
        }
    }

    #[test]
    fn test_detail_pass_flags_coastal_regions() {
        let (mut g, mut islands) = island_world();
        let mut layer = grown_layer(&mut g, &mut islands, 0.0);
        layer.refresh_details(&mut g);

        // A single island with full coverage: every region with ocean contact
        // is coastal and owns reclassified coast hexes.
        let coastal_regions = layer.iter().filter(|r| r.is_coastal).count();
        assert!(coastal_regions > 0);
        for region in layer.iter() {
            if region.is_coastal {
                assert!(!region.coast_hexes.is_empty());
                for &id in &region.coast_hexes {
                    assert!(g.hex(id).is_coast());
                }
            }
            assert_eq!(region.is_secluded, region.neighbor_region_ids.is_empty());
            assert_eq!(region.is_surrounded, !region.is_coastal && !region.is_secluded);
        }
    }

    #[test]
    fn test_stray_regions_revert_to_water() {
        let (mut g, mut islands) = island_world();
        let mut layer = grown_layer(&mut g, &mut islands, 0.0);
        layer.refresh_details(&mut g);

        // Shrink one region below the floor by hand to force stripping.
        let victim = layer.iter().find(|r| r.hexes.len() < STRAY_REGION_FLOOR).map(|r| r.id);
        let victim = match victim {
            Some(id) => id,
            None => {
                let id = layer.iter().next().unwrap().id;
                let region = layer.regions.get_mut(&id).unwrap();
                let dropped: Vec<HexId> = region.hexes.iter().copied().skip(2).collect();
                for hid in dropped {
                    region.hexes.remove(&hid);
                    let hex = g.hex_mut(hid);
                    hex.region = None;
                    hex.island = None;
                    hex.set_terrain(Terrain::Ocean);
                }
                assert_eq!(region.hexes.len(), 2);
                id
            }
        };

        layer.remove_stray_regions(&mut g, &mut islands);
        assert!(layer.get(victim).is_none());
        // Stripped hexes became water and carry a depth value.
        for h in g.iter() {
            if h.is_land() || h.is_coast() {
                assert!(h.region.is_some());
                assert!(h.island.is_some());
            }
        }
    }

    #[test]
    fn test_biomes_assigned_after_details() {
        let (mut g, mut islands) = island_world();
        crate::geography::set_depth(&mut g);
        let mut layer = grown_layer(&mut g, &mut islands, 0.0);
        layer.refresh_details(&mut g);
        for region in layer.iter() {
            assert!((0.0..=1.0).contains(&region.avg_elevation));
            assert!((0.0..=1.0).contains(&region.avg_dryness));
            assert_eq!(region.base_color, region.biome.base_color());
        }
    }
}
