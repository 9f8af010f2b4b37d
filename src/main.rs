use anyhow::{bail, Context, Result};
use clap::Parser;
use carousel::constants::*;
use carousel::loader::FileLoader;
use carousel::retry::RetryPolicy;
use carousel::sink::EventBuffer;
use carousel::{source, Carousel, CarouselConfig, Collaborators, Page, SlideDescriptor};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

#[cfg(feature = "viewer")]
mod viewer;

const CONTAINER_ID: &str = "carousel";

#[derive(Parser)]
#[command(name = "carousel")]
#[command(about = "Image carousel: raylib viewer or headless simulation")]
struct Cli {
    /// Image directory, or a TOML manifest listing the slides
    source: PathBuf,

    /// Carousel options (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulate this many seconds without a window, then print the state as JSON
    #[arg(long, value_name = "SECONDS")]
    headless: Option<f32>,

    /// Do not start autoplay
    #[arg(long)]
    no_autoplay: bool,

    /// Autoplay interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop at the first and last slide instead of wrapping
    #[arg(long)]
    finite: bool,

    /// Load every image at start instead of only those near the active slide
    #[arg(long)]
    eager: bool,

    /// Load attempts per image
    #[arg(long, default_value_t = RETRY_ATTEMPTS)]
    attempts: u32,
}

fn load_slides(path: &Path) -> Result<(Vec<SlideDescriptor>, PathBuf)> {
    if path.is_dir() {
        let slides = source::scan_dir(path)
            .with_context(|| format!("Failed to load images from '{}'", path.display()))?;
        Ok((slides, path.to_path_buf()))
    } else {
        let slides = source::load_manifest(path)
            .with_context(|| format!("Failed to read manifest '{}'", path.display()))?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((slides, root))
    }
}

fn load_config(cli: &Cli) -> Result<CarouselConfig> {
    let mut config = match &cli.config {
        Some(path) => CarouselConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => CarouselConfig::default(),
    };
    if cli.no_autoplay {
        config.auto_play = false;
    }
    if let Some(interval) = cli.interval_ms {
        config.interval_ms = interval;
    }
    if cli.finite {
        config.infinite = false;
    }
    if cli.eager {
        config.lazy_load = false;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (slides, root) = load_slides(&cli.source)?;
    let config = load_config(&cli)?;
    log::info!("{} slides from {}", slides.len(), root.display());

    let policy = RetryPolicy {
        max_attempts: cli.attempts,
        ..RetryPolicy::default()
    };
    let loader = FileLoader::spawn(&root, policy).context("Failed to start asset loader")?;
    let analytics = Rc::new(EventBuffer::default());

    let page = Page::new();
    page.add_container(CONTAINER_ID);
    let mut carousel = Carousel::mount(
        &page,
        CONTAINER_ID,
        slides,
        config,
        Collaborators::new(loader).with_analytics(analytics.clone()),
    )?;

    match cli.headless {
        Some(seconds) => run_headless(&mut carousel, seconds)?,
        None => run_window(&page, &mut carousel)?,
    }

    let summary = json!({
        "state": carousel.snapshot(),
        "events": analytics.events(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    carousel.destroy();
    Ok(())
}

/// Steps the engine at a fixed frame rate, as fast as possible.
fn run_headless(carousel: &mut Carousel, seconds: f32) -> Result<()> {
    let dt = Duration::from_secs_f32(FRAME_TIME);
    for _ in 0..frame_count(seconds)? {
        carousel.update(dt);
    }
    log::info!(
        "Simulated {:.1}s: slide {} of {}",
        seconds,
        carousel.current_index() + 1,
        carousel.slide_count()
    );
    Ok(())
}

fn frame_count(seconds: f32) -> Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("--headless needs a finite, non-negative number of seconds");
    }
    Ok((seconds / FRAME_TIME).round() as u64)
}

#[cfg(feature = "viewer")]
fn run_window(page: &Page, carousel: &mut Carousel) -> Result<()> {
    viewer::run(page, CONTAINER_ID, carousel)
}

#[cfg(not(feature = "viewer"))]
fn run_window(_page: &Page, _carousel: &mut Carousel) -> Result<()> {
    bail!("built without the `viewer` feature; pass --headless <SECONDS>")
}
