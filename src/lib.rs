//! Procedural generation of hexagon-tiled exterior maps.
//!
//! A map grows in layers over a single [`grid::HexGrid`]: a cellular
//! automaton roughs out land and ocean, flood fills carve the land into
//! islands, BFS distance fields and lake/river placement add geography, and
//! seeded region growth produces the political layer with a biome per
//! region. [`generator::ExteriorMapGenerator`] runs the whole pipeline and
//! [`export`] turns the result into a serializable artifact or a debug PNG.

pub mod base_layer;
pub mod biomes;
pub mod config;
pub mod export;
pub mod generator;
pub mod geography;
pub mod grid;
pub mod hex;
pub mod islands;
pub mod regions;
pub mod seeds;
pub mod shape;

pub use biomes::{Biome, Humidity, Temperature};
pub use config::GenerationRequest;
pub use generator::{ExteriorMapGenerator, GeneratedWorld, GenerationError};
pub use grid::{DistanceMetric, HexGrid};
pub use hex::{Hex, HexId, IslandId, RegionId, Terrain};
