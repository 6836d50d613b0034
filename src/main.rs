use clap::Parser;

use hexmap_generator::config::GenerationRequest;
use hexmap_generator::export;
use hexmap_generator::generator::ExteriorMapGenerator;
use hexmap_generator::grid::DistanceMetric;
use hexmap_generator::{Humidity, Temperature};

#[derive(Parser, Debug)]
#[command(name = "hexmap_generator")]
#[command(about = "Generate procedural hexagon-tiled exterior maps")]
struct Args {
    /// Map width in pixels (height is derived from it)
    #[arg(short = 'W', long, default_value = "1000")]
    pixel_width: u32,

    /// Hexagon size in pixels
    #[arg(long, default_value = "10")]
    hex_size: u32,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Fraction of hexes initially rolled as land
    #[arg(long, default_value = "0.4")]
    initial_land_pct: f32,

    /// Minimum land fraction a map must reach to be accepted
    #[arg(long, default_value = "0.3")]
    required_land_pct: f32,

    /// Cellular-automaton passes per terraform attempt
    #[arg(long, default_value = "20")]
    terraform_iterations: u32,

    /// Islands smaller than this many hexes are dissolved
    #[arg(long, default_value = "12")]
    min_island_size: usize,

    /// Climate temperature band
    #[arg(long, value_enum, default_value = "temperate")]
    temperature: Temperature,

    /// Climate humidity band
    #[arg(long, value_enum, default_value = "average")]
    humidity: Humidity,

    /// Use flat-top hexagons instead of pointy-top
    #[arg(long)]
    flat: bool,

    /// Distance metric for the geographic fields
    #[arg(long, value_enum, default_value = "euclidean")]
    metric: DistanceMetric,

    /// Write the map artifact as JSON to this path
    #[arg(short, long)]
    output: Option<String>,

    /// Render a debug PNG of the map to this path
    #[arg(long)]
    render: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let request = GenerationRequest {
        pixel_width: args.pixel_width,
        hex_size: args.hex_size,
        initial_land_pct: args.initial_land_pct,
        required_land_pct: args.required_land_pct,
        terraform_iterations: args.terraform_iterations,
        min_island_size: args.min_island_size,
        temperature: args.temperature,
        humidity: args.humidity,
        pointy: !args.flat,
        metric: args.metric,
        ..GenerationRequest::default()
    };

    println!("Generating exterior map with seed: {}", seed);
    let generator = ExteriorMapGenerator::new(request, seed);
    let world = match generator.generate_world() {
        Ok(world) => world,
        Err(error) => {
            eprintln!("generation failed: {error}");
            std::process::exit(1);
        }
    };
    let artifact = world.artifact();

    println!(
        "Map {}x{}: {} hexes, {} islands, {} regions",
        artifact.dimensions.0,
        artifact.dimensions.1,
        artifact.hexes.len(),
        artifact.islands.len(),
        artifact.regions.len()
    );
    let mut biome_counts: std::collections::BTreeMap<&str, usize> = Default::default();
    for region in artifact.regions.values() {
        *biome_counts.entry(region.biome.display_name()).or_default() += 1;
    }
    for (biome, count) in biome_counts {
        println!("  {}: {} regions", biome, count);
    }

    if let Some(path) = &args.output {
        match serde_json::to_string_pretty(&artifact) {
            Ok(json) => {
                if let Err(error) = std::fs::write(path, json) {
                    eprintln!("failed to write {path}: {error}");
                    std::process::exit(1);
                }
                println!("Wrote map artifact to {path}");
            }
            Err(error) => {
                eprintln!("failed to serialize artifact: {error}");
                std::process::exit(1);
            }
        }
    }

    if let Some(path) = &args.render {
        if let Err(error) = export::render_png(&world.grid, &world.regions, path) {
            eprintln!("failed to render {path}: {error}");
            std::process::exit(1);
        }
        println!("Rendered map to {path}");
    }
}
