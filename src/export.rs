//! Serialized map artifact and debug PNG rendering.
//!
//! The artifact is the generator's only output contract: dimensions, climate
//! settings, and per-island/region/hex summaries keyed by id. It round-trips
//! through serde so clients can reload a generated map exactly.

use std::collections::BTreeMap;

use image::{Rgb, RgbImage};

use crate::biomes::{Biome, Humidity, Temperature};
use crate::grid::HexGrid;
use crate::hex::Terrain;
use crate::islands::IslandLayer;
use crate::regions::RegionLayer;

const BACKGROUND_COLOR: [u8; 3] = [52, 73, 94];
const OCEAN_COLOR: [u8; 3] = [54, 54, 97];
const FRESHWATER_COLOR: [u8; 3] = [85, 125, 166];

/// Complete serialized output of one generation run.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MapArtifact {
    pub dimensions: (i32, i32),
    pub temperature: Temperature,
    pub humidity: Humidity,
    pub islands: BTreeMap<u32, IslandSummary>,
    pub regions: BTreeMap<u32, RegionSummary>,
    pub hexes: BTreeMap<u32, HexSummary>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IslandSummary {
    pub region_ids: Vec<u32>,
    pub area: f64,
    pub centroid: (i32, i32),
    pub vertices: Vec<(i32, i32)>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegionSummary {
    pub biome: Biome,
    pub island_id: u32,
    pub area: f64,
    pub neighboring_region_ids: Vec<u32>,
    pub near_lake: bool,
    pub near_river: bool,
    pub coastal: bool,
    pub secluded: bool,
    pub surrounded: bool,
    pub average_dryness: f32,
    pub average_elevation: f32,
    pub centroid: (i32, i32),
    pub vertices: Vec<(i32, i32)>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HexSummary {
    #[serde(rename = "type")]
    pub terrain: Terrain,
    pub elevation: f32,
    pub dryness: f32,
    pub depth: f32,
    pub vertices: Vec<(i32, i32)>,
}

/// Assemble the artifact from the finished layers.
pub fn build_artifact(
    temperature: Temperature,
    humidity: Humidity,
    grid: &HexGrid,
    islands: &IslandLayer,
    regions: &RegionLayer,
) -> MapArtifact {
    let island_summaries = islands
        .iter()
        .map(|island| {
            let outline = island.outline(grid);
            (
                island.id.0,
                IslandSummary {
                    region_ids: island.region_ids.iter().map(|r| r.0).collect(),
                    area: outline.area,
                    centroid: outline.centroid,
                    vertices: outline.vertices,
                },
            )
        })
        .collect();

    let region_summaries = regions
        .iter()
        .map(|region| {
            let outline = region.outline(grid);
            (
                region.id.0,
                RegionSummary {
                    biome: region.biome,
                    island_id: region.island_id.0,
                    area: outline.area,
                    neighboring_region_ids: region
                        .neighbor_region_ids
                        .iter()
                        .map(|r| r.0)
                        .collect(),
                    near_lake: region.near_lake,
                    near_river: region.near_river,
                    coastal: region.is_coastal,
                    secluded: region.is_secluded,
                    surrounded: region.is_surrounded,
                    average_dryness: region.avg_dryness,
                    average_elevation: region.avg_elevation,
                    centroid: outline.centroid,
                    vertices: outline.vertices,
                },
            )
        })
        .collect();

    let hex_summaries = grid
        .iter()
        .map(|hex| {
            (
                hex.id.0,
                HexSummary {
                    terrain: hex.terrain(),
                    elevation: hex.elevation,
                    dryness: hex.dryness,
                    depth: hex.depth,
                    vertices: hex.vertices.to_vec(),
                },
            )
        })
        .collect();

    MapArtifact {
        dimensions: (grid.actual_width, grid.actual_height),
        temperature,
        humidity,
        islands: island_summaries,
        regions: region_summaries,
        hexes: hex_summaries,
    }
}

/// Render the map to a PNG: regions in their biome color shaded by elevation,
/// water shaded darker with depth.
pub fn render_png(
    grid: &HexGrid,
    regions: &RegionLayer,
    path: &str,
) -> Result<(), image::ImageError> {
    let width = grid.actual_width.max(1) as u32;
    let height = grid.actual_height.max(1) as u32;
    let mut img = RgbImage::from_pixel(width, height, Rgb(BACKGROUND_COLOR));

    for hex in grid.iter() {
        let color = match hex.terrain() {
            Terrain::Land | Terrain::Coast => {
                let base = hex
                    .region
                    .and_then(|id| regions.get(id))
                    .map(|r| r.base_color)
                    .unwrap_or(BACKGROUND_COLOR);
                shade(base, (0.5 + hex.elevation).min(1.0))
            }
            Terrain::Ocean => shade(OCEAN_COLOR, 1.0 - hex.depth),
            Terrain::Lake | Terrain::River => shade(FRESHWATER_COLOR, 1.0 - hex.depth),
        };
        fill_convex_polygon(&mut img, &hex.vertices, Rgb(color));
    }

    img.save(path)
}

fn shade(color: [u8; 3], factor: f32) -> [u8; 3] {
    let f = factor.clamp(0.0, 1.0);
    [
        (color[0] as f32 * f) as u8,
        (color[1] as f32 * f) as u8,
        (color[2] as f32 * f) as u8,
    ]
}

/// Scanline fill over the polygon's bounding box. Hex cells are convex, so a
/// consistent-side test against every edge suffices.
fn fill_convex_polygon(img: &mut RgbImage, vertices: &[(i32, i32); 6], color: Rgb<u8>) {
    let min_x = vertices.iter().map(|v| v.0).min().unwrap_or(0).max(0);
    let max_x = vertices.iter().map(|v| v.0).max().unwrap_or(0).min(img.width() as i32 - 1);
    let min_y = vertices.iter().map(|v| v.1).min().unwrap_or(0).max(0);
    let max_y = vertices.iter().map(|v| v.1).max().unwrap_or(0).min(img.height() as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_convex(vertices, x, y) {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn point_in_convex(vertices: &[(i32, i32); 6], px: i32, py: i32) -> bool {
    let mut sign = 0i64;
    for i in 0..vertices.len() {
        let (x1, y1) = vertices[i];
        let (x2, y2) = vertices[(i + 1) % vertices.len()];
        let cross = (x2 - x1) as i64 * (py - y1) as i64 - (y2 - y1) as i64 * (px - x1) as i64;
        if cross != 0 {
            if sign == 0 {
                sign = cross.signum();
            } else if sign != cross.signum() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_convex_hex() {
        let vertices = [(10, 0), (15, 5), (15, 10), (10, 15), (5, 10), (5, 5)];
        assert!(point_in_convex(&vertices, 10, 7));
        assert!(!point_in_convex(&vertices, 0, 0));
        assert!(!point_in_convex(&vertices, 20, 7));
    }

    #[test]
    fn test_shade_clamps() {
        assert_eq!(shade([100, 100, 100], 2.0), [100, 100, 100]);
        assert_eq!(shade([100, 100, 100], 0.0), [0, 0, 0]);
        assert_eq!(shade([100, 200, 50], 0.5), [50, 100, 25]);
    }
}
