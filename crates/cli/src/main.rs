use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{bounded, tick, Receiver, RecvTimeoutError};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use backdrop_core::capture::domain::capture_source::CaptureSource;
use backdrop_core::capture::infrastructure::gpu_copy_capture_source::GpuCopyCaptureSource;
use backdrop_core::capture::infrastructure::live_view_capture_source::LiveViewCaptureSource;
use backdrop_core::capture::infrastructure::shared_surface::SharedSurface;
use backdrop_core::capture::infrastructure::static_image_capture_source::StaticImageCaptureSource;
use backdrop_core::compositor::domain::backdrop_compositor::{BackdropCompositor, Panel};
use backdrop_core::compositor::infrastructure::cpu_backdrop_compositor::CpuBackdropCompositor;
use backdrop_core::governor::domain::governor_config::GovernorConfig;
use backdrop_core::governor::domain::sampling_profile::SamplingProfile;
use backdrop_core::governor::infrastructure::config_loader;
use backdrop_core::sampler::frame_sampler::FrameSampler;
use backdrop_core::sampler::sampler_config::SamplerConfig;
use backdrop_core::shared::content_size::ContentSize;

/// Samples a moving backdrop at UI cadence and composites a blurred panel.
#[derive(Parser)]
#[command(name = "backdrop-sampler")]
struct Cli {
    /// Background image. Scrolled across the surface, or sampled directly
    /// with `--source static`. A generated pattern is used when omitted.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Capture source: live, gpu-copy or static.
    #[arg(long, default_value = "live")]
    source: String,

    /// Requested capture rate (clamped to 30-120).
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Blur radius in source pixels.
    #[arg(long, default_value = "12")]
    blur_radius: u32,

    /// Sampling profile: balanced or performance.
    #[arg(long, default_value = "balanced")]
    profile: SamplingProfile,

    /// Display refresh rate reported to the sampler.
    #[arg(long, default_value = "60")]
    display_hz: f32,

    /// How long to run the request loop.
    #[arg(long, default_value = "2000")]
    duration_ms: u64,

    /// Interval between capture requests (one UI frame).
    #[arg(long, default_value = "16")]
    tick_ms: u64,

    /// Governor tuning JSON. Defaults to the per-user config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Panel rectangle in source pixels: X,Y,W,H.
    #[arg(long, value_delimiter = ',')]
    panel: Option<Vec<f32>>,

    /// Write the composited panel of the last frame as PNG.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Logical content size: WxH.
    #[arg(long, default_value = "1280x720")]
    size: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let size = parse_size(&cli.size)?;
    let governor = config_loader::load_or_default(cli.config.as_deref());
    let background = match &cli.image {
        Some(path) => Some(image::open(path)?.into_rgba8()),
        None => None,
    };

    let surface = Arc::new(SharedSurface::new());
    let source = build_source(&cli, size, &surface)?;
    sample(&cli, size, governor, background, surface, &source)
}

/// Runs the sampler against `source`, releasing it however the run ends.
fn sample(
    cli: &Cli,
    size: ContentSize,
    governor: GovernorConfig,
    background: Option<RgbaImage>,
    surface: Arc<SharedSurface>,
    source: &Arc<dyn CaptureSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = drive(cli, size, governor, background, surface, source);
    source.release();
    outcome
}

/// Drives the request loop and writes the optional panel.
fn drive(
    cli: &Cli,
    size: ContentSize,
    governor: GovernorConfig,
    background: Option<RgbaImage>,
    surface: Arc<SharedSurface>,
    source: &Arc<dyn CaptureSource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (stop_tx, stop_rx) = bounded::<()>(0);
    let producer = spawn_producer(surface, background, size, cli.tick_ms, stop_rx)?;

    let display_hz = cli.display_hz;
    let sampler = FrameSampler::new(SamplerConfig::with_governor(governor), move || display_hz);
    let frames = sampler.frames();
    log::info!(
        "Sampling {}x{} via {} source for {}ms ({} profile, radius {})",
        size.width,
        size.height,
        cli.source,
        cli.duration_ms,
        cli.profile,
        cli.blur_radius
    );

    let ticker = tick(Duration::from_millis(cli.tick_ms));
    let deadline = Instant::now() + Duration::from_millis(cli.duration_ms);
    let mut updates = 0usize;
    while Instant::now() < deadline {
        ticker.recv()?;
        sampler.request_capture(Some(source), cli.fps, cli.blur_radius, cli.profile, false);
        if frames.has_changed() {
            updates += 1;
        }
    }

    drop(stop_tx);
    if producer.join().is_err() {
        log::warn!("Surface producer panicked");
    }

    let stats = sampler.stats();
    stats.log_summary();
    log::info!("Observed {updates} backdrop updates, governor ended {}", stats.level);

    if let Some(output) = &cli.output {
        let panel = parse_panel(cli.panel.as_deref(), size)?;
        write_panel(&sampler, panel, cli.blur_radius, output)?;
    }
    Ok(())
}

fn build_source(
    cli: &Cli,
    size: ContentSize,
    surface: &Arc<SharedSurface>,
) -> Result<Arc<dyn CaptureSource>, Box<dyn std::error::Error>> {
    let source: Arc<dyn CaptureSource> = match cli.source.as_str() {
        "gpu-copy" => Arc::new(GpuCopyCaptureSource::for_surface(surface.clone())),
        "static" => {
            let path = cli.image.as_deref().ok_or("--source static requires --image")?;
            Arc::new(StaticImageCaptureSource::open(path, Box::new(move || size))?)
        }
        _ => Arc::new(LiveViewCaptureSource::for_surface(surface.clone())),
    };
    Ok(source)
}

/// Presents a new surface frame every tick until `stop` disconnects.
fn spawn_producer(
    surface: Arc<SharedSurface>,
    background: Option<RgbaImage>,
    size: ContentSize,
    tick_ms: u64,
    stop: Receiver<()>,
) -> std::io::Result<thread::JoinHandle<()>> {
    let background = background.map(|img| imageops::resize(&img, size.width, size.height, FilterType::Triangle));
    thread::Builder::new()
        .name("surface-producer".to_string())
        .spawn(move || {
            let mut phase = 0u32;
            loop {
                let frame = match &background {
                    Some(img) => scrolled(img, phase),
                    None => pattern(size, phase),
                };
                surface.present(frame);
                phase = (phase + 4) % 65_536;
                match stop.recv_timeout(Duration::from_millis(tick_ms)) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            }
            surface.clear();
        })
}

fn scrolled(background: &RgbaImage, phase: u32) -> RgbaImage {
    let width = background.width();
    let shift = phase % width.max(1);
    RgbaImage::from_fn(width, background.height(), |x, y| *background.get_pixel((x + shift) % width, y))
}

/// Diagonal colour bands drifting with `phase`.
fn pattern(size: ContentSize, phase: u32) -> RgbaImage {
    RgbaImage::from_fn(size.width, size.height, |x, y| {
        let band = ((x + y + phase) / 48) % 6;
        let width = size.width.max(1);
        let shade = ((x + phase) % width * 255 / width) as u8;
        match band {
            0 => Rgba([200, 60, 40, 255]),
            1 => Rgba([40, 120, 200, 255]),
            2 => Rgba([shade, 180, 90, 255]),
            3 => Rgba([30, 30, 40, 255]),
            4 => Rgba([220, 200, shade, 255]),
            _ => Rgba([90, shade, 160, 255]),
        }
    })
}

fn write_panel(
    sampler: &FrameSampler,
    panel: Panel,
    blur_radius: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = sampler.latest_frame().ok_or("No backdrop frame was captured")?;
    let compositor = CpuBackdropCompositor::new();
    let composited = compositor.composite(&frame, panel, blur_radius as f32)?;
    composited.save(output)?;
    log::info!(
        "Panel written to {} (capture {}x{}, scale {:.2}, blur factor {:.2})",
        output.display(),
        frame.capture_size().width,
        frame.capture_size().height,
        frame.quality_scale(),
        frame.blur_radius_factor()
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let valid_sources = ["live", "gpu-copy", "static"];
    if !valid_sources.contains(&cli.source.as_str()) {
        return Err(format!(
            "Source must be one of: live, gpu-copy, static, got '{}'",
            cli.source
        )
        .into());
    }
    if cli.source == "static" && cli.image.is_none() {
        return Err("--source static requires --image".into());
    }
    if let Some(image) = &cli.image {
        if !image.exists() {
            return Err(format!("Image file not found: {}", image.display()).into());
        }
    }
    if cli.tick_ms == 0 {
        return Err("Tick interval must be at least 1ms".into());
    }
    if !(cli.display_hz.is_finite() && cli.display_hz > 0.0) {
        return Err(format!("Display refresh rate must be positive, got {}", cli.display_hz).into());
    }
    Ok(())
}

fn parse_size(value: &str) -> Result<ContentSize, Box<dyn std::error::Error>> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Size must look like WxH, got '{value}'"))?;
    let size = ContentSize::new(w.trim().parse()?, h.trim().parse()?);
    if size.is_empty() {
        return Err(format!("Size must be non-zero, got '{value}'").into());
    }
    Ok(size)
}

/// Defaults to a panel covering the middle of the content.
fn parse_panel(values: Option<&[f32]>, size: ContentSize) -> Result<Panel, Box<dyn std::error::Error>> {
    let Some(values) = values else {
        return Ok(Panel::new(
            size.width as f32 / 4.0,
            size.height as f32 / 4.0,
            size.width / 2,
            size.height / 2,
        ));
    };
    let [x, y, w, h] = values else {
        return Err(format!("Panel needs X,Y,W,H, got {} values", values.len()).into());
    };
    if *w < 1.0 || *h < 1.0 {
        return Err(format!("Panel size must be at least 1x1, got {w}x{h}").into());
    }
    Ok(Panel::new(*x, *y, w.round() as u32, h.round() as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_core::capture::domain::capture_error::CaptureError;
    use backdrop_core::shared::pixels::CaptureBuffer;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        released: AtomicUsize,
    }

    impl CaptureSource for CountingSource {
        fn size(&self) -> ContentSize {
            ContentSize::new(32, 32)
        }

        fn capture(&self, _target: &mut CaptureBuffer) -> Result<(), CaptureError> {
            Err(CaptureError::NotReady)
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[rstest]
    #[case::lower("1280x720", 1280, 720)]
    #[case::upper("64X48", 64, 48)]
    #[case::spaced(" 10 x 20 ", 10, 20)]
    fn test_parse_size(#[case] value: &str, #[case] width: u32, #[case] height: u32) {
        assert_eq!(parse_size(value).unwrap(), ContentSize::new(width, height));
    }

    #[rstest]
    #[case::no_separator("1280")]
    #[case::zero("0x720")]
    #[case::garbage("axb")]
    fn test_parse_size_rejects(#[case] value: &str) {
        assert!(parse_size(value).is_err());
    }

    #[test]
    fn test_default_panel_is_centred() {
        let panel = parse_panel(None, ContentSize::new(800, 400)).unwrap();
        assert_eq!(panel, Panel::new(200.0, 100.0, 400, 200));
    }

    #[test]
    fn test_explicit_panel() {
        let panel = parse_panel(Some(&[10.0, 20.0, 30.4, 40.6]), ContentSize::new(800, 400)).unwrap();
        assert_eq!(panel, Panel::new(10.0, 20.0, 30, 41));
    }

    #[test]
    fn test_degenerate_panel_rejected() {
        assert!(parse_panel(Some(&[0.0, 0.0, 0.0, 10.0]), ContentSize::new(800, 400)).is_err());
        assert!(parse_panel(Some(&[0.0, 0.0]), ContentSize::new(800, 400)).is_err());
    }

    #[test]
    fn test_pattern_is_opaque_and_animated() {
        let size = ContentSize::new(64, 32);
        let a = pattern(size, 0);
        let b = pattern(size, 8);
        assert_eq!(a.dimensions(), (64, 32));
        assert!(a.pixels().all(|p| p.0[3] == 255));
        assert_ne!(a, b);
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "backdrop-sampler",
            "--source",
            "gpu-copy",
            "--profile",
            "performance",
            "--panel",
            "1,2,3,4",
        ]);
        assert_eq!(cli.source, "gpu-copy");
        assert_eq!(cli.profile, SamplingProfile::Performance);
        assert_eq!(cli.panel, Some(vec![1.0, 2.0, 3.0, 4.0]));
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_source_released_when_output_fails() {
        let cli = Cli::parse_from([
            "backdrop-sampler",
            "--duration-ms",
            "20",
            "--tick-ms",
            "5",
            "--output",
            "unused.png",
            "--panel",
            "0,0,0,5",
        ]);
        let size = ContentSize::new(32, 32);
        let counting = Arc::new(CountingSource::default());
        let source: Arc<dyn CaptureSource> = counting.clone();

        let outcome = sample(&cli, size, GovernorConfig::default(), None, Arc::new(SharedSurface::new()), &source);

        assert!(outcome.is_err());
        assert_eq!(counting.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_static_source_requires_image() {
        let cli = Cli::parse_from(["backdrop-sampler", "--source", "static"]);
        assert!(validate(&cli).is_err());
    }
}
