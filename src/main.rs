use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use planet_geo::config::{
    CompressionExtremum, FillEpsilon, GeoConfig, NoiseMode, OceanSelection, PlateGrowth,
};
use planet_geo::export;
use planet_geo::{generate_icosphere, Result, StageSeeds};

#[derive(Parser, Debug)]
#[command(name = "planet_geo")]
#[command(about = "Generate plates, elevation and drainage on a spherical mesh")]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Master seed (uses random seed if neither this nor the config sets one)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Icosphere subdivision level
    #[arg(short = 'n', long)]
    subdivisions: Option<u32>,

    /// Number of tectonic plates
    #[arg(short = 'p', long)]
    plates: Option<usize>,

    /// Number of volcanoes
    #[arg(long)]
    volcanoes: Option<usize>,

    /// Fraction of plates that are oceanic (exact quota)
    #[arg(long, conflicts_with = "ocean_probability")]
    ocean_fraction: Option<f64>,

    /// Probability of each plate being oceanic (independent draws)
    #[arg(long)]
    ocean_probability: Option<f64>,

    /// Plate growth strategy
    #[arg(long, value_enum)]
    growth: Option<PlateGrowth>,

    /// Which foreign neighbor decides a boundary region's compression
    #[arg(long, value_enum)]
    extremum: Option<CompressionExtremum>,

    /// How noise is combined with elevation
    #[arg(long, value_enum)]
    noise_mode: Option<NoiseMode>,

    /// Noise strength
    #[arg(long)]
    noise_amplitude: Option<f32>,

    /// Keep raw elevation instead of scaling each sign to [-1, 1]
    #[arg(long)]
    no_normalize: bool,

    /// Skip squaring elevations above sea level
    #[arg(long)]
    no_falloff: bool,

    /// Redraw the sink-fill epsilon every pass around this base value
    #[arg(long)]
    random_fill_epsilon: Option<f32>,

    /// Override the plate seed only
    #[arg(long)]
    plate_seed: Option<u64>,

    /// Override the ocean classification seed only
    #[arg(long)]
    ocean_seed: Option<u64>,

    /// Override the volcano selection seed only
    #[arg(long)]
    volcano_seed: Option<u64>,

    /// Override the distance field tie-breaking seed only
    #[arg(long)]
    distance_seed: Option<u64>,

    /// Override the noise seed only
    #[arg(long)]
    noise_seed: Option<u64>,

    /// Override the sink filling seed only
    #[arg(long)]
    fill_seed: Option<u64>,

    /// Directory for PNG maps and the JSON summary
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width of exported maps in pixels
    #[arg(short = 'W', long, default_value = "1024")]
    width: u32,
}

impl Args {
    fn build_config(&self) -> Result<GeoConfig> {
        let mut config = match &self.config {
            Some(path) => GeoConfig::from_json_file(path)?,
            None => GeoConfig {
                seed: rand::random(),
                ..Default::default()
            },
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n) = self.subdivisions {
            config.subdivisions = n;
        }
        if let Some(p) = self.plates {
            config.plate_count = p;
        }
        if let Some(v) = self.volcanoes {
            config.volcano_count = v;
        }
        if let Some(fraction) = self.ocean_fraction {
            config.ocean_selection = OceanSelection::Quota { fraction };
        }
        if let Some(probability) = self.ocean_probability {
            config.ocean_selection = OceanSelection::Bernoulli { probability };
        }
        if let Some(growth) = self.growth {
            config.plate_growth = growth;
        }
        if let Some(extremum) = self.extremum {
            config.compression_extremum = extremum;
        }
        if let Some(mode) = self.noise_mode {
            config.noise_mode = mode;
        }
        if let Some(amplitude) = self.noise_amplitude {
            config.noise_amplitude = amplitude;
        }
        if self.no_normalize {
            config.normalize_elevation = false;
        }
        if self.no_falloff {
            config.tectonic_falloff = false;
        }
        if let Some(base) = self.random_fill_epsilon {
            config.fill_epsilon = FillEpsilon::Randomized { base };
        }

        config.validate()?;
        Ok(config)
    }

    fn build_seeds(&self, master: u64) -> StageSeeds {
        let mut builder = StageSeeds::builder(master);
        if let Some(seed) = self.plate_seed {
            builder = builder.plates(seed);
        }
        if let Some(seed) = self.ocean_seed {
            builder = builder.oceans(seed);
        }
        if let Some(seed) = self.volcano_seed {
            builder = builder.volcanoes(seed);
        }
        if let Some(seed) = self.distance_seed {
            builder = builder.distance(seed);
        }
        if let Some(seed) = self.noise_seed {
            builder = builder.noise(seed);
        }
        if let Some(seed) = self.fill_seed {
            builder = builder.fill(seed);
        }
        builder.build()
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.build_config()?;
    let seeds = args.build_seeds(config.seed);

    println!("Generating geography with seed: {}", config.seed);
    println!("Stage seeds: {}", seeds);

    let (mesh, geo) = generate_icosphere(&config, &seeds)?;
    let summary = export::GeoSummary::new(&mesh, &geo);

    println!(
        "Mesh: {} regions, {} triangles (subdivision {})",
        summary.regions, summary.triangles, config.subdivisions
    );
    println!(
        "Created {} plates ({} continental, {} oceanic) by {}",
        summary.plates,
        summary.plates - summary.oceanic_plates,
        summary.oceanic_plates,
        config.plate_growth
    );
    println!(
        "Boundaries: {} mountain, {} coastline, {} ocean seeds, {} volcanoes",
        summary.mountains,
        summary.coastlines,
        summary.ocean_seeds,
        summary.volcanoes.len()
    );
    println!(
        "Elevation range: {:.3} to {:.3} ({:.1}% above sea level)",
        summary.min_elevation,
        summary.max_elevation,
        100.0 * summary.land_fraction
    );
    println!(
        "Drainage: {} sinks above sea, {} regions raised by filling",
        summary.sinks_above_sea, summary.filled_regions
    );

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("elevation.png");
        export::export_elevation_png(&mesh, &geo.elevation, args.width, &path)?;
        println!("Exported {}", path.display());

        let path = dir.join("plates.png");
        export::export_plates_png(&mesh, &geo.plates, args.width, &path)?;
        println!("Exported {}", path.display());

        let path = dir.join("summary.json");
        export::export_summary_json(&mesh, &geo, &path)?;
        println!("Exported {}", path.display());
    }

    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
