use clap::Parser;
use std::path::PathBuf;

use crate::demo::Mode;
use crate::render::visualizer::Skin;

#[derive(Parser, Debug)]
#[command(name = "aeromix", about = "Gesture-controlled audio mixer demo")]
pub struct Cli {
    /// Where the audio state lives
    #[arg(short, long, value_enum, default_value_t = Mode::Simulated)]
    pub mode: Mode,

    /// Backend origin that serves /api/* (remote mode)
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    pub backend: String,

    /// State poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub poll_ms: u64,

    /// Frames per second of the render loop
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 500)]
    pub height: u32,

    /// Visualizer skin
    #[arg(long, value_enum, default_value_t = Skin::Orbs)]
    pub skin: Skin,

    /// Stop after this many frames (runs until closed or quit otherwise)
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Record the visualizer to a video file via ffmpeg
    #[arg(short, long)]
    pub record: Option<PathBuf>,

    /// Open a window (requires the `window` feature)
    #[arg(long)]
    pub window: bool,

    /// Scripted input, e.g. "500:volume_up,1000:capture,5000:quit"
    #[arg(short, long)]
    pub script: Option<String>,

    /// Start with the camera capture running
    #[arg(long)]
    pub capture: bool,

    /// Pretend no camera is attached
    #[arg(long)]
    pub no_camera: bool,

    /// TTF font used for labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Config file (defaults to ./aeromix.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the marketing page with a snapshot of the demo and exit
    #[arg(long)]
    pub page: bool,
}
