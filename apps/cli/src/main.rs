mod commands;
mod console;
mod preview;
mod shell;

use anyhow::Context;
use clap::Parser;
use commands::{Command, HELP};
use console::{print_line, render, Level};
use shell::{Shell, SourceKind};
use sightassist_application::SessionConfig;
use sightassist_audio::RodioPlayer;
use sightassist_vision::YoloDetector;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Live object detection with spoken hazard alerts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YOLOv8 ONNX model
    #[arg(short, long)]
    model: PathBuf,

    /// JSON session config; missing keys take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video device index (/dev/videoN)
    #[arg(long)]
    camera: Option<usize>,

    /// Replay the images in this directory instead of using the camera
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Rewrite this JPEG with the annotated frame on every iteration
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Start with audio alerts enabled
    #[arg(long)]
    alerts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sightassist=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(index) = cli.camera {
        config.camera.index = index;
    }
    if cli.alerts {
        config.alerts_enabled = true;
    }

    tracing::info!("Starting sightassist");

    let detector = YoloDetector::load(&cli.model, config.detector.clone())
        .with_context(|| format!("failed to load model {}", cli.model.display()))?;
    let params = detector.params();
    tracing::info!(
        input_size = params.input_size,
        conf_threshold = params.conf_threshold,
        iou_threshold = params.iou_threshold,
        "Detector ready"
    );
    let player = RodioPlayer::new().context("failed to open audio output")?;

    let source = match cli.frames_dir {
        Some(dir) => SourceKind::Frames(dir),
        None => SourceKind::Camera(config.camera.clone()),
    };

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut shell = Shell::new(
        config,
        source,
        cli.preview,
        Arc::new(detector),
        Arc::new(player),
        events_tx,
    );

    println!("Object Detection & Assistive Vision");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed
                    if shell.is_running() {
                        shell.stop().await;
                    }
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Start) => shell.start()?,
                    Ok(Command::Stop) => shell.stop().await,
                    Ok(Command::Alerts(enabled)) => shell.set_alerts(enabled),
                    Ok(Command::Status) => shell.status(),
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => {
                        if shell.is_running() {
                            shell.stop().await;
                        }
                        break;
                    }
                    Err(e) => print_line(Level::Warning, &format!("{e} ({HELP})")),
                }
            }
            Some((topic, payload)) = events_rx.recv() => {
                if let Some((level, message)) = render(&topic, &payload) {
                    print_line(level, &message);
                }
            }
        }
    }

    // Surface anything the last session emitted while stopping.
    while let Ok((topic, payload)) = events_rx.try_recv() {
        if let Some((level, message)) = render(&topic, &payload) {
            print_line(level, &message);
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
