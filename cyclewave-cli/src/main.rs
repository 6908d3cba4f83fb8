//! Cyclewave CLI: mounts the ambient widget in a terminal.

mod host;
mod term;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use cyclewave_engine::backend::output_device_names;
use cyclewave_engine::{CpalBackend, IntervalScheduler, OfflineBackend, OfflineOptions, WidgetConfig, WidgetController};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use crate::host::{HostClock, HostOptions};

#[derive(Parser, Debug)]
#[command(name = "cyclewave")]
#[command(about = "Five-minute ambient cycle in your terminal", long_about = None)]
struct Args {
    /// TOML widget configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output device name (default device otherwise)
    #[arg(long)]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Render without an audio device
    #[arg(long)]
    offline: bool,

    /// Initial volume 0.0-1.0
    #[arg(long)]
    volume: Option<f32>,

    /// Start muted
    #[arg(long)]
    muted: bool,

    /// Dense layout
    #[arg(long)]
    compact: bool,

    /// Start playing on launch
    #[arg(long)]
    autoplay: bool,

    /// Quit after this many seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Pin the clock to this Unix time at launch
    #[arg(long)]
    at: Option<f64>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::ERROR,
            (false, 0) => LevelFilter::WARN,
            (false, 1) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        }
    }

    /// File config (or defaults) with command-line overrides applied.
    fn widget_config(&self) -> anyhow::Result<WidgetConfig> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => WidgetConfig::default(),
        };
        if let Some(v) = self.volume {
            cfg.volume = v;
        }
        cfg.muted |= self.muted;
        cfg.compact |= self.compact;
        Ok(cfg.validated())
    }

    fn duration(&self) -> anyhow::Result<Option<Duration>> {
        self.duration
            .map(|s| Duration::try_from_secs_f64(s).with_context(|| format!("invalid --duration {s}")))
            .transpose()
    }
}

fn load_config(path: &Path) -> anyhow::Result<WidgetConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    if args.list_devices {
        let names = output_device_names().context("listing output devices")?;
        println!("Available output devices:");
        for name in names {
            println!("- {name}");
        }
        return Ok(());
    }

    let config = args.widget_config()?;
    let opts = HostOptions { duration: args.duration()?, autoplay: args.autoplay };
    let scheduler = IntervalScheduler::new();
    let clock = HostClock::new(args.at);
    let keys = host::spawn_key_reader();
    info!(?config, offline = args.offline, "mounting widget");

    if args.offline {
        let options = OfflineOptions::default();
        let backend = OfflineBackend::new(options);
        let widget = WidgetController::mount(config, backend.clone(), scheduler.clone(), clock);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pump = |dt: Duration| {
            backend.render((dt.as_secs_f64() * f64::from(options.sample_rate)) as usize);
        };
        host::run(widget, &scheduler, keys, &opts, pump)
    } else {
        let backend = CpalBackend::new(args.device.clone());
        let widget = WidgetController::mount(config, backend, scheduler.clone(), clock);
        host::run(widget, &scheduler, keys, &opts, |_| {})
    }
}
