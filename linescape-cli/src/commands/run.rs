//! `linescape run`: the live frame loop without a window.
//!
//! Frames are drawn at the configured rate into an offscreen surface. A
//! status line is printed once per second's worth of frames; the last frame
//! can be saved on exit.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Args;
use linescape::config::ConfigFile;
use linescape::render::{save_frame, DebugInfo, InputEvent, Pixmap};
use linescape::RenderLoop;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{build_runtime, start_logging, ViewArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    pub seconds: Option<u64>,

    /// Park the pointer at these screen coordinates to report hover details
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub pointer: Option<Vec<f64>>,

    /// Save the last frame to this PNG file on exit
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: RunArgs, config: ConfigFile) -> Result<(), CliError> {
    let _logging = start_logging(&config)?;
    let runtime = build_runtime()?;
    let viewer = args.view.build_viewer(&config, runtime.handle().clone())?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let report_every = u64::from(config.render.fps.max(1));
    let last_frame: Arc<Mutex<Option<Pixmap>>> = Arc::default();
    let keep = args.output.is_some().then(|| Arc::clone(&last_frame));
    let sink = move |frame: &Pixmap, info: &DebugInfo| {
        if info.frame % report_every == 0 {
            println!("{}", status_line(info));
        }
        if let Some(slot) = &keep {
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(frame.clone());
            }
        }
    };

    let (render_loop, input) =
        RenderLoop::new(viewer, args.view.width, args.view.height, Box::new(sink))?;

    println!("Press Ctrl+C to stop");
    let frames = runtime.block_on(async {
        if let Some(&[x, y]) = args.pointer.as_deref() {
            let _ = input.send(InputEvent::PointerMove { x, y }).await;
        }
        if let Some(seconds) = args.seconds {
            let timer = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(seconds)).await;
                timer.cancel();
            });
        }
        let (_viewer, frames) = render_loop.run(shutdown).await;
        drop(input);
        frames
    });
    info!(frames, "Run finished");

    if let Some(path) = &args.output {
        let frame = last_frame.lock().ok().and_then(|mut slot| slot.take());
        match frame {
            Some(frame) => {
                save_frame(&frame, path)?;
                println!("Saved {}", path.display());
            }
            None => println!("No frame was drawn; nothing saved"),
        }
    }
    println!("Drew {} frames", frames);
    Ok(())
}

/// One-line progress summary.
fn status_line(info: &DebugInfo) -> String {
    let mut line = format!(
        "frame {:>6}  tiles {}/{}  {}  fetch {}",
        info.frame, info.ready, info.required, info.compositor, info.compositor.fetch
    );
    if let Some(hover) = &info.hover {
        if let Some(path) = &hover.path {
            line.push_str("  ");
            line.push_str(path);
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use linescape::composite::CompositorStats;
    use linescape::Box2D;

    fn info(frame: u64) -> DebugInfo {
        DebugInfo {
            frame,
            eye: (0.0, 0.0, 10.0),
            viewport: Box2D::new(),
            pixels_per_unit: 1.0,
            required: 4,
            ready: 3,
            hover: None,
            compositor: CompositorStats::default(),
        }
    }

    #[test]
    fn test_status_line_counts_tiles() {
        let line = status_line(&info(120));
        assert!(line.starts_with("frame    120"));
        assert!(line.contains("tiles 3/4"));
    }
}
