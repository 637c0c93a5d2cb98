mod capture;
mod cli;
mod config;
mod demo;
mod encode;
mod error;
mod input;
mod page;
mod panel;
mod params;
mod remote;
mod render;
mod store;
mod surface;
mod task;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use capture::{Camera, NoCamera, SyntheticCamera};
use cli::Cli;
use demo::{DemoWidget, Mode};
use input::{InputSource, ScriptedInput};
use page::PageComposition;
use panel::GestureDispatchPanel;
use remote::{HttpBackend, SimulatedBackend, StateBackend};
use render::canvas::Canvas;
use render::text::TextOverlay;
use render::visualizer::{Skin, VisualizerRenderer};
use surface::{HeadlessSurface, RecordingSurface, Surface};
use task::Liveness;

const LABEL_FONT_SIZE: f32 = 20.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut timeout_ms = 3000;
    let mut recognize_every = 90;

    let config_path = cli.config.clone().or_else(config::discover_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.mode == Mode::Simulated { cli.mode = cfg.backend.mode; }
            if cli.backend == "http://127.0.0.1:5000" { cli.backend = cfg.backend.origin; }
            if cli.poll_ms == 1000 { cli.poll_ms = cfg.backend.poll_ms; }
            if cli.width == 1000 { cli.width = cfg.display.width; }
            if cli.height == 500 { cli.height = cfg.display.height; }
            if cli.fps == 60 { cli.fps = cfg.display.fps; }
            if cli.skin == Skin::Orbs { cli.skin = cfg.display.skin; }
            if cli.font.is_none() { cli.font = cfg.display.font; }
            if !cli.no_camera { cli.no_camera = !cfg.capture.camera; }
            timeout_ms = cfg.backend.timeout_ms;
            recognize_every = cfg.capture.recognize_every;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let backend: Arc<dyn StateBackend> = match cli.mode {
        Mode::Simulated => {
            log::info!("Simulated backend (recognizes ~1 in {} frames)", recognize_every);
            Arc::new(SimulatedBackend::new(recognize_every))
        }
        Mode::Remote => {
            log::info!("Remote backend at {}", cli.backend);
            Arc::new(HttpBackend::new(&cli.backend, Duration::from_millis(timeout_ms))?)
        }
    };

    if cli.page {
        print_page(&backend);
        return Ok(());
    }

    let camera: Box<dyn Camera> = if cli.no_camera {
        Box::new(NoCamera)
    } else {
        Box::new(SyntheticCamera::new())
    };

    let overlay = TextOverlay::discover(cli.font.as_deref(), LABEL_FONT_SIZE);
    let renderer = VisualizerRenderer::new(cli.skin, overlay);
    let mut demo = DemoWidget::mount(
        Arc::clone(&backend),
        camera,
        renderer,
        Duration::from_millis(cli.poll_ms.max(1)),
    );

    let mut sources: Vec<Box<dyn InputSource>> = Vec::new();
    if let Some(ref script) = cli.script {
        sources.push(Box::new(ScriptedInput::parse(script)?));
    }
    if cli.capture {
        sources.push(Box::new(ScriptedInput::new(vec![(
            Duration::ZERO,
            input::InputEvent::ToggleCapture,
        )])));
    }

    render::canvas::validate_size(cli.width, cli.height)?;
    let mut surface = open_surface(&cli)?;
    let mut canvas = Canvas::new(cli.width, cli.height);
    let frame_period = Duration::from_secs_f64(1.0 / cli.fps.max(1) as f64);

    log::info!("aeromix - gesture-controlled mixer demo");
    log::info!("Resolution: {}x{} @ {}fps, skin: {:?}", cli.width, cli.height, cli.fps, cli.skin);

    let pb = cli.frames.filter(|_| cli.record.is_some()).map(|total| {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    });

    let mut frame_idx: u64 = 0;
    let mut next_frame = Instant::now();

    'frames: while surface.is_open() && demo.is_mounted() {
        if cli.frames.is_some_and(|limit| frame_idx >= limit) {
            break;
        }
        let now = Instant::now();

        let mut events = surface.input(now);
        for source in sources.iter_mut() {
            events.extend(source.poll(now));
        }
        for event in events {
            if !demo.handle(event, now) {
                log::info!("Quit requested");
                break 'frames;
            }
        }

        let report = demo.tick(now, wall_clock_ms(), &mut canvas);
        if frame_idx % cli.fps.max(1) as u64 == 0 {
            let texts: Vec<&str> = report.labels.iter().map(|l| l.text.as_str()).collect();
            log::debug!("Frame {}: {}", frame_idx, texts.join(" | "));
            for line in &report.status {
                log::debug!("  status: {}", line);
            }
            for (heading, [up, down]) in demo.panel().rows(&report.params) {
                log::trace!("  {:<14} {} / {}", heading, up, down);
            }
        }
        surface.present(&canvas)?;

        frame_idx += 1;
        if let Some(ref pb) = pb {
            pb.set_position(frame_idx);
        }

        next_frame += frame_period;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else {
            next_frame = now;
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Recording complete");
    }

    let last = demo.params();
    let sent = demo.capture().frames_sent();
    demo.teardown();
    surface.finish()?;
    log::info!(
        "Done after {} frames ({} sent for recognition); final {}",
        frame_idx,
        sent,
        params::Param::ALL.map(|p| last.label(p)).join(", ")
    );
    Ok(())
}

/// Milliseconds since the Unix epoch, the animation clock of the visualizer.
fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

fn open_surface(cli: &Cli) -> Result<Box<dyn Surface>> {
    if cli.window {
        #[cfg(feature = "window")]
        {
            return Ok(Box::new(surface::WindowSurface::new(
                "AeroMix",
                cli.width,
                cli.height,
                cli.fps,
            )?));
        }
        #[cfg(not(feature = "window"))]
        anyhow::bail!(
            "Window support requires the 'window' feature. \
             Rebuild with: cargo build --features window"
        );
    }
    if let Some(ref path) = cli.record {
        log::info!("Recording to {}", path.display());
        return Ok(Box::new(RecordingSurface::new(
            path, cli.width, cli.height, cli.fps, "libx264", 18,
        )?));
    }
    Ok(Box::new(HeadlessSurface::default()))
}

fn print_page(backend: &Arc<dyn StateBackend>) {
    let params = backend.fetch_state().unwrap_or_else(|err| {
        log::warn!("{}", err);
        Default::default()
    });
    let panel = GestureDispatchPanel::new(Arc::clone(backend), Liveness::new());
    let mut demo = String::new();
    for (heading, [up, down]) in panel.rows(&params) {
        demo.push_str(&format!("  {:<14} [{}] [{}]\n", heading, up, down));
    }
    let page = PageComposition::standard();
    log::debug!("Page sections: {:?}", page.sections());
    print!("{}", page.render(&demo));
}
