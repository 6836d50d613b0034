//! Single hexagon cell: terrain state, scalar fields, and cached neighbor data.

/// Terrain state of a hex after terraforming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Terrain {
    Land,
    Coast,
    #[default]
    Ocean,
    Lake,
    River,
}

/// Number of terrain states, sizing the neighbor histograms.
pub const TERRAIN_STATES: usize = 5;

impl Terrain {
    pub fn index(self) -> usize {
        match self {
            Terrain::Land => 0,
            Terrain::Coast => 1,
            Terrain::Ocean => 2,
            Terrain::Lake => 3,
            Terrain::River => 4,
        }
    }

}

/// Index of a hex in the grid arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId(pub u32);

impl HexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Island identifier (arena order at discovery time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct IslandId(pub u32);

/// Region identifier (discovery order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RegionId(pub u32);

/// Counts of neighbor terrain states, indexed by [`Terrain::index`].
pub type StateCounts = [u8; TERRAIN_STATES];

/// A single grid cell addressed by doubled-offset coordinates.
///
/// Invariant: `x + y` is always even for an allocated hex. Neighbor lists are
/// arena indices into the owning grid, populated once at grid construction.
/// The state histograms (`direct`, `secondary`, `total`) are valid only
/// immediately after a grid-wide refresh; any terrain mutation invalidates
/// them.
#[derive(Clone, Debug)]
pub struct Hex {
    pub id: HexId,
    pub x: i32,
    pub y: i32,

    pub center: (i32, i32),
    pub vertices: [(i32, i32); 6],

    terrain: Terrain,

    pub elevation: f32,
    pub dryness: f32,
    pub depth: f32,

    pub island: Option<IslandId>,
    pub region: Option<RegionId>,

    pub direct_neighbors: Vec<HexId>,
    pub secondary_neighbors: Vec<HexId>,

    pub direct: StateCounts,
    pub secondary: StateCounts,
    pub total: StateCounts,
}

impl Hex {
    pub fn new(id: HexId, x: i32, y: i32) -> Self {
        debug_assert!((x + y) % 2 == 0, "hex coordinates must have even sum ({x}, {y})");
        Self {
            id,
            x,
            y,
            center: (0, 0),
            vertices: [(0, 0); 6],
            terrain: Terrain::Ocean,
            elevation: 0.0,
            dryness: 0.0,
            depth: 0.0,
            island: None,
            region: None,
            direct_neighbors: Vec::new(),
            secondary_neighbors: Vec::new(),
            direct: [0; TERRAIN_STATES],
            secondary: [0; TERRAIN_STATES],
            total: [0; TERRAIN_STATES],
        }
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn set_terrain(&mut self, terrain: Terrain) {
        self.terrain = terrain;
    }

    pub fn is_land(&self) -> bool {
        self.terrain == Terrain::Land
    }

    pub fn is_coast(&self) -> bool {
        self.terrain == Terrain::Coast
    }

    pub fn is_ocean(&self) -> bool {
        self.terrain == Terrain::Ocean
    }

    pub fn is_lake(&self) -> bool {
        self.terrain == Terrain::Lake
    }

    pub fn is_river(&self) -> bool {
        self.terrain == Terrain::River
    }

    /// Land or coast: the states that carry elevation/dryness and can host
    /// islands and regions.
    pub fn is_usable_land(&self) -> bool {
        self.is_land() || self.is_coast()
    }

    /// Count of direct neighbors in the given state, from the last refresh.
    pub fn direct_count(&self, terrain: Terrain) -> u8 {
        self.direct[terrain.index()]
    }

    /// Combined direct + secondary neighbor count from the last refresh.
    pub fn total_count(&self, terrain: Terrain) -> u8 {
        self.total[terrain.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_indices_are_dense() {
        let all = [Terrain::Land, Terrain::Coast, Terrain::Ocean, Terrain::Lake, Terrain::River];
        let mut seen = [false; TERRAIN_STATES];
        for t in all {
            seen[t.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_new_hex_defaults_to_ocean() {
        let h = Hex::new(HexId(0), 2, 4);
        assert!(h.is_ocean());
        assert_eq!(h.island, None);
        assert_eq!(h.region, None);
        assert_eq!(h.elevation, 0.0);
    }
}
