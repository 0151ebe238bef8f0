use camcast_base::{Resolution, log};
use camcast_capture::{CaptureConfig, V4l2Device};
use camcast_server::{MjpegServer, listen_addr};
use camcast_stream::{FrameBroadcaster, FramePump};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "camcast-server")]
#[command(about = "Stream a V4L2 camera as MJPEG over HTTP")]
#[command(version)]
struct Cli {
    /// Video capture device
    #[arg(long, default_value = "/dev/video0")]
    video_device: String,

    /// Capture width in pixels
    #[arg(long, default_value_t = 320)]
    video_width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 240)]
    video_height: u32,

    /// Resolution mode id (1-11), overrides width and height
    #[arg(long)]
    video_mode: Option<u32>,

    /// Frames published per second
    #[arg(long, default_value_t = 2)]
    video_frame_rate: u32,

    /// Address to serve on; an empty host binds all interfaces
    #[arg(long, default_value = ":8888")]
    host_port: String,

    /// Write logs to daily files in this directory instead of stdout
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log debug messages
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolution(&self) -> Result<Resolution, String> {
        match self.video_mode {
            Some(mode) => {
                Resolution::from_mode(mode).ok_or_else(|| format!("unknown video mode {mode}"))
            }
            None => Resolution::new(self.video_width, self.video_height).ok_or_else(|| {
                format!(
                    "invalid resolution {}x{}",
                    self.video_width, self.video_height
                )
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    match &cli.log_dir {
        Some(dir) => camcast_base::init_file_logger(dir, level)?,
        None => camcast_base::init_stdout_logger(level),
    }

    let config = CaptureConfig::default()
        .with_device(cli.video_device.clone())
        .with_resolution(cli.resolution()?)
        .with_fps(cli.video_frame_rate);

    let broadcaster = FrameBroadcaster::new();
    let pump = FramePump::new(V4l2Device::new(), config, broadcaster.clone());

    if let Err(e) = pump.start().await {
        log::error!("failed to start video stream: {}", e);
        return Err(e.into());
    }

    let addr = listen_addr(&cli.host_port);
    let server = match MjpegServer::bind(addr.as_str(), broadcaster).await {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to serve on {}: {}", addr, e);
            pump.stop().await?;
            return Err(e.into());
        }
    };
    log::info!("serving MJPEG on http://{}/", server.local_addr());

    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");

    drop(server);
    pump.stop().await?;
    Ok(())
}
