use anyhow::{Context, Result};
use clap::Parser;
use essence_core::composite::SoftwareCompositor;
use essence_core::config::AppConfig;
use essence_lib::app::App;
use essence_lib::ui::frame;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mode to run the simulation in
    #[arg(short, long, value_enum, default_value = "headless")]
    mode: Mode,

    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Override the number of agents
    #[arg(short, long)]
    agents: Option<usize>,

    /// Override the RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Restore a save before running (.json, .json.gz or .rkyv)
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write a save after running
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write the final frame as PNG
    #[arg(long)]
    frame: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Eq)]
enum Mode {
    /// Simulate only
    Headless,
    /// Simulate and composite every tick in software
    Render,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if args.config.exists() {
        let text = std::fs::read_to_string(&args.config)
            .with_context(|| format!("reading {}", args.config.display()))?;
        AppConfig::from_toml(&text).with_context(|| format!("parsing {}", args.config.display()))?
    } else {
        tracing::info!(path = %args.config.display(), "No config file, using defaults");
        AppConfig::default()
    };

    if let Some(agents) = args.agents {
        config.simulation.agents = agents;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if config.simulation.seed.is_none() {
        config.simulation.seed = Some(rand::random());
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    essence_core::init_logging();
    let args = Args::parse();
    let config = load_config(&args)?;

    let mut app = App::new(config)?;

    if let Some(path) = &args.load {
        let loaded = essence_io::load_state(path)?;
        let report = app.import_state(&loaded);
        if report.rejected_count() > 0 {
            tracing::warn!(rejected = report.rejected_count(), "Some trail channels were not restored");
        }
    }

    let (w, h) = (
        app.config().viewport.width.round() as usize,
        app.config().viewport.height.round() as usize,
    );
    let needs_frames = args.mode == Mode::Render || args.frame.is_some();
    let mut compositor = needs_frames.then(|| SoftwareCompositor::new(w, h));

    let started = Instant::now();
    let dt = app.config().simulation.fixed_dt;
    for _ in 0..args.ticks {
        app.tick(dt);
        if args.mode == Mode::Render {
            if let Some(c) = compositor.as_mut() {
                c.clear();
                app.render(c);
            }
        }
    }
    let elapsed = started.elapsed();

    let stats = app.field().stats();
    tracing::info!(
        ticks = args.ticks,
        seed = app.seed(),
        elapsed_ms = elapsed.as_millis() as u64,
        mass = stats.total_mass,
        occupied = stats.occupied_cells,
        authors = stats.distinct_authors,
        "Run finished"
    );

    if let Some(path) = &args.save {
        essence_io::save_state(path, &app.export_state())?;
    }

    if let Some(path) = &args.frame {
        if let Some(c) = compositor.as_mut() {
            if args.mode != Mode::Render {
                c.clear();
                app.render(c);
            }
            frame::save_png(path, c)?;
        }
    }

    Ok(())
}
