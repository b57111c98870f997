//! Main entry point for the sparkfield viewer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sparkfield::{ConfigError, EngineConfig, Viewer, ViewerError, PRESET_NAMES};

#[derive(Parser, Debug)]
#[command(name = "sparkfield", version, about = "Interactive GPU particle emitter")]
struct Cli {
    /// Built-in configuration to start from
    #[arg(short, long, default_value = "default", conflicts_with = "config")]
    preset: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sprite image (PNG or JPEG); a generated star is used otherwise
    #[arg(short, long)]
    texture: Option<PathBuf>,

    /// Seed for reproducible spawning
    #[arg(long)]
    seed: Option<u64>,

    /// Field rotation around Z, in radians per second
    #[arg(long, default_value_t = 0.05)]
    rotation_speed: f32,

    /// Print the selected configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// List preset names and exit
    #[arg(long)]
    list_presets: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

fn load_config(cli: &Cli) -> Result<EngineConfig, ConfigError> {
    match &cli.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            EngineConfig::from_json_file(path)
        }
        None => EngineConfig::preset(&cli.preset),
    }
}

fn run(cli: Cli) -> Result<(), ViewerError> {
    if cli.list_presets {
        for name in PRESET_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let config = load_config(&cli)?;

    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let title = match &cli.config {
        Some(path) => format!("Sparkfield - {}", path.display()),
        None => format!("Sparkfield - {}", cli.preset),
    };

    let mut viewer = Viewer::new(config)
        .with_title(title)
        .with_rotation_speed(cli.rotation_speed);
    if let Some(path) = cli.texture {
        viewer = viewer.with_texture(path);
    }
    if let Some(seed) = cli.seed {
        viewer = viewer.with_seed(seed);
    }

    viewer.run()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
