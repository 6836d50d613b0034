//! Biome classification and climate modifiers.
//!
//! A region's averaged (elevation, dryness) pair maps through a fixed 4x6 band
//! table to one of nine biomes; the map-wide temperature and humidity settings
//! shift those averages and size the freshwater budget before lookup.

/// Climate classification assigned to a political region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
pub enum Biome {
    TropicalDesert,
    TropicalForest,
    TemperateDesert,
    TemperateForest,
    Grassland,
    Taiga,
    Bare,
    Tundra,
    Snow,
}

impl Biome {
    pub fn display_name(&self) -> &'static str {
        match self {
            Biome::TropicalDesert => "Tropical Desert",
            Biome::TropicalForest => "Tropical Forest",
            Biome::TemperateDesert => "Temperate Desert",
            Biome::TemperateForest => "Temperate Forest",
            Biome::Grassland => "Grassland",
            Biome::Taiga => "Taiga",
            Biome::Bare => "Bare",
            Biome::Tundra => "Tundra",
            Biome::Snow => "Snow",
        }
    }

    /// Base display color for map rendering.
    pub fn base_color(&self) -> [u8; 3] {
        match self {
            Biome::TropicalDesert => [233, 221, 199],
            Biome::TropicalForest => [156, 187, 169],
            Biome::TemperateDesert => [228, 232, 202],
            Biome::TemperateForest => [164, 196, 168],
            Biome::Grassland => [196, 212, 170],
            Biome::Taiga => [204, 212, 187],
            Biome::Bare => [153, 153, 153],
            Biome::Tundra => [221, 221, 187],
            Biome::Snow => [248, 248, 248],
        }
    }
}

/// Map-wide temperature setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
pub enum Temperature {
    Freezing,
    Cold,
    Temperate,
    Warm,
    Hot,
}

/// Map-wide humidity setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
pub enum Humidity {
    Barren,
    Dry,
    Average,
    Wet,
    Drenched,
}

/// Offsets and freshwater bounds derived from the climate settings.
#[derive(Clone, Copy, Debug)]
pub struct ClimateModifiers {
    /// Added to each region's average elevation before biome lookup.
    pub elevation_offset: f32,
    /// Added to each region's average dryness before biome lookup.
    pub dryness_offset: f32,
    /// Inclusive bounds on how many lakes the geography layer aims for.
    pub lake_count: (u32, u32),
    /// Inclusive bounds on BFS ring expansions per lake.
    pub lake_expansions: (u32, u32),
}

/// Derive climate modifiers from the temperature and humidity settings.
/// Colder maps read as higher (snowier) terrain; drier maps get fewer,
/// smaller lakes. Bounds are clamped non-negative and ordered.
pub fn climate_modifiers(temperature: Temperature, humidity: Humidity) -> ClimateModifiers {
    let elevation_offset = match temperature {
        Temperature::Freezing => 0.5,
        Temperature::Cold => 0.25,
        Temperature::Temperate => 0.0,
        Temperature::Warm => -0.25,
        Temperature::Hot => -0.5,
    };

    let mut min_expansions: i32 = 1;
    let mut max_expansions: i32 = 4;
    let mut min_lakes: i32 = 2;
    let mut max_lakes: i32 = 4;
    let dryness_offset = match humidity {
        Humidity::Barren => {
            min_expansions -= 1;
            max_expansions -= 4;
            min_lakes -= 2;
            max_lakes -= 4;
            0.5
        }
        Humidity::Dry => {
            max_expansions -= 2;
            min_lakes -= 1;
            max_lakes -= 2;
            0.25
        }
        Humidity::Average => 0.0,
        Humidity::Wet => {
            min_expansions += 1;
            max_expansions += 1;
            min_lakes += 1;
            max_lakes += 1;
            -0.25
        }
        Humidity::Drenched => {
            min_expansions += 1;
            max_expansions += 2;
            min_lakes += 2;
            max_lakes += 2;
            -0.5
        }
    };

    let min_lakes = min_lakes.max(0) as u32;
    let max_lakes = (max_lakes.max(0) as u32).max(min_lakes);
    let min_expansions = min_expansions.max(0) as u32;
    let max_expansions = (max_expansions.max(0) as u32).max(min_expansions);

    ClimateModifiers {
        elevation_offset,
        dryness_offset,
        lake_count: (min_lakes, max_lakes),
        lake_expansions: (min_expansions, max_expansions),
    }
}

/// Lookup table rows are elevation bands 1..=4 (low to high), columns are
/// dryness bands 1..=6 (wet to dry).
const BIOME_TABLE: [[Biome; 6]; 4] = [
    [
        Biome::TropicalForest,
        Biome::TropicalForest,
        Biome::TemperateForest,
        Biome::TemperateForest,
        Biome::Grassland,
        Biome::TropicalDesert,
    ],
    [
        Biome::TropicalForest,
        Biome::TemperateForest,
        Biome::TemperateForest,
        Biome::Grassland,
        Biome::Grassland,
        Biome::TemperateDesert,
    ],
    [
        Biome::Taiga,
        Biome::Taiga,
        Biome::Grassland,
        Biome::Grassland,
        Biome::TemperateDesert,
        Biome::TemperateDesert,
    ],
    [
        Biome::Snow,
        Biome::Snow,
        Biome::Snow,
        Biome::Tundra,
        Biome::Bare,
        Biome::Bare,
    ],
];

/// Map an (elevation, dryness) pair in `[0, 1]` to a biome.
pub fn pick_biome(elevation: f32, dryness: f32) -> Biome {
    let e_band = band(elevation, 4);
    let d_band = band(dryness, 6);
    BIOME_TABLE[e_band - 1][d_band - 1]
}

/// Scale a `[0, 1]` value into a band `1..=count`; values at or below the
/// first boundary fall in band 1.
fn band(value: f32, count: usize) -> usize {
    let scaled = value * count as f32;
    (scaled.ceil() as usize).clamp(1, count)
}
