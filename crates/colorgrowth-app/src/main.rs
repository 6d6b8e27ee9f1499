//! Command-line front end: renders PNG images of randomly mutating colored
//! regions grown outward from seed coordinates, like colored bacteria
//! spreading over a surface.

mod preset;
mod sink;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use colorgrowth_core::{GrowthConfig, GrowthSim, SeedCount};
use colorgrowth_render::{FrameWriter, save_png};
use preset::{Preset, load_preset, save_preset};
use sink::RunObserver;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "colorgrowth",
    version,
    about = "Renders PNG images like bacteria that produce random color mutations as they grow over a surface"
)]
struct Cli {
    /// How many images to generate. Image k derives its seed from the base
    /// seed plus k, so every image in a batch is individually reproducible.
    #[arg(short = 'n', long, default_value_t = 1)]
    image_count: u32,

    /// Width of the output image(s) in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Height of the output image(s) in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Vary each RGB channel by a random offset in [-rshift, rshift], scaled
    /// by one half, at every color mutation.
    #[arg(short, long)]
    rshift: Option<u32>,

    /// Canvas color: '[r,g,b]' with values 0-255, or a single gray level
    /// like 150.
    #[arg(short, long)]
    background_color: Option<String>,

    /// Base color that seed coordinates mutate away from; same format as the
    /// background color, which it defaults to.
    #[arg(short, long)]
    color_mutation_base: Option<String>,

    /// Spread throttle, 0 (flood) through 6 (barely creeps); values above 6
    /// are clamped.
    #[arg(long)]
    viscosity: Option<u32>,

    /// Exact number of origin coordinates; overrides --seeds-range.
    #[arg(short = 'q', long)]
    seeds: Option<u32>,

    /// Inclusive random range for the origin-coordinate count, as 'min,max'.
    #[arg(long)]
    seeds_range: Option<String>,

    /// Seed for the run's random number generator; drawn from entropy (and
    /// recorded in the preset) when omitted.
    #[arg(short = 's', long)]
    random_seed: Option<u64>,

    /// Canvas fill fraction to stop painting at, in (0, 1]; 1 paints until
    /// the canvas is exhausted.
    #[arg(long)]
    stop_fill: Option<f64>,

    /// Corral coordinates that were painted around but never painted, and
    /// revive them once the living ones die out.
    #[arg(long)]
    reclaim_orphans: Option<bool>,

    /// Save an animation frame into a '<image>_frames' subfolder every N
    /// passes; 0 disables.
    #[arg(short = 'a', long)]
    frame_interval: Option<u32>,

    /// Write the resolved configuration next to each image as a .cgp preset.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    save_preset: bool,

    /// Load every parameter from a .cgp preset, ignoring the other switches.
    #[arg(long)]
    load_preset: Option<PathBuf>,

    /// Directory rendered output lands in.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let invocation = resolve_invocation(&cli)?;
    let base_seed = invocation.config.rng_seed.unwrap_or_else(rand::random);
    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create output directory {}", cli.out_dir.display()))?;

    info!(
        images = invocation.image_count,
        seed = base_seed,
        "starting color growth"
    );
    for index in 0..invocation.image_count {
        let mut config = invocation.config.clone();
        config.rng_seed = Some(base_seed.wrapping_add(u64::from(index)));
        run_image(config, &cli, index, invocation.image_count)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Assemble the run parameters: a preset replaces everything, otherwise CLI
/// switches override the defaults.
fn resolve_invocation(cli: &Cli) -> Result<Preset> {
    if let Some(path) = &cli.load_preset {
        let preset = load_preset(path)?;
        info!(preset = %path.display(), "loaded preset; other switches are ignored");
        return Ok(preset);
    }
    Ok(Preset {
        config: build_config(cli)?,
        image_count: cli.image_count,
    })
}

fn build_config(cli: &Cli) -> Result<GrowthConfig> {
    let mut config = GrowthConfig::default();
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(rshift) = cli.rshift {
        config.rshift = rshift;
    }
    if let Some(raw) = &cli.background_color {
        config.background_color = parse_color(raw)?;
    }
    if let Some(raw) = &cli.color_mutation_base {
        config.color_mutation_base = Some(parse_color(raw)?);
    }
    if let Some(viscosity) = cli.viscosity {
        config.viscosity = viscosity;
    }
    if let Some(seeds) = cli.seeds {
        if cli.seeds_range.is_some() {
            warn!("--seeds overrides --seeds-range; the range will not be used");
        }
        config.seed_count = SeedCount::Fixed(seeds);
    } else if let Some(raw) = &cli.seeds_range {
        let (min, max) = parse_seed_range(raw)?;
        config.seed_count = SeedCount::Range { min, max };
    }
    config.rng_seed = cli.random_seed;
    if let Some(fraction) = cli.stop_fill {
        config.stop_fill_fraction = fraction;
    }
    if let Some(reclaim) = cli.reclaim_orphans {
        config.reclaim_orphans = reclaim;
    }
    if let Some(interval) = cli.frame_interval {
        config.frame_interval = interval;
    }
    Ok(config)
}

/// Accepts '[r,g,b]' (brackets optional) or a single gray level.
fn parse_color(raw: &str) -> Result<[u8; 3]> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<&str> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let channel = |part: &str| -> Result<u8> {
        part.parse()
            .with_context(|| format!("color channel '{part}' must be an integer in 0-255"))
    };
    match parts.as_slice() {
        [gray] => {
            let level = channel(gray)?;
            Ok([level; 3])
        }
        [r, g, b] => Ok([channel(r)?, channel(g)?, channel(b)?]),
        _ => bail!("color '{raw}' must be '[r,g,b]' or a single gray level"),
    }
}

/// Accepts 'min,max', tolerating surrounding parentheses or brackets.
fn parse_seed_range(raw: &str) -> Result<(u32, u32)> {
    let trimmed = raw
        .trim()
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']']);
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [min, max] => Ok((
            min.parse()
                .with_context(|| format!("seed range minimum '{min}' must be an integer"))?,
            max.parse()
                .with_context(|| format!("seed range maximum '{max}' must be an integer"))?,
        )),
        _ => bail!("seed range '{raw}' must be 'min,max'"),
    }
}

/// Unique stem for one image's outputs: unix seconds plus three random hex
/// characters, so simultaneous runs do not collide.
fn output_stem() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let tag: u32 = rand::random_range(0..0x1000);
    format!("{seconds}_{tag:03x}_colorgrowth")
}

fn run_image(config: GrowthConfig, cli: &Cli, index: u32, total: u32) -> Result<()> {
    let stem = output_stem();
    let final_path = cli.out_dir.join(format!("{stem}.png"));
    let state_path = cli.out_dir.join(format!("{stem}-state.png"));
    let frames = if config.frame_interval > 0 {
        let dir = cli.out_dir.join(format!("{stem}_frames"));
        Some(
            FrameWriter::create(&dir, config.fill_quota())
                .with_context(|| format!("failed to create frame directory {}", dir.display()))?,
        )
    } else {
        None
    };

    let observer = RunObserver::new(state_path.clone(), frames);
    let mut sim = GrowthSim::with_observer(config, Box::new(observer))?;
    for note in sim.advisories() {
        warn!("{note}");
    }
    info!(
        seed = sim.rng_seed(),
        seeds = sim.resolved_seed_count(),
        quota = sim.fill_quota(),
        "generating image"
    );
    sim.run();

    save_png(sim.grid(), &final_path)
        .with_context(|| format!("failed to save {}", final_path.display()))?;
    // The in-flight progress snapshot is superseded by the final image.
    if state_path.exists() {
        let _ = fs::remove_file(&state_path);
    }

    if cli.save_preset {
        let mut resolved = sim.config().clone();
        resolved.rng_seed = Some(sim.rng_seed());
        resolved.seed_count = SeedCount::Fixed(sim.resolved_seed_count());
        let preset_path = cli.out_dir.join(format!("{stem}.cgp"));
        save_preset(
            &preset_path,
            &Preset {
                config: resolved,
                image_count: 1,
            },
        )?;
    }

    info!(
        painted = sim.painted(),
        path = %final_path.display(),
        "created image {} of {}",
        index + 1,
        total
    );
    Ok(())
}
