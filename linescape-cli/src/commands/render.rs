//! `linescape render`: draw one frame once its tiles have arrived.

use std::path::PathBuf;

use clap::Args;
use linescape::config::ConfigFile;
use linescape::render::{save_frame, Pixmap, RenderError};
use tracing::info;

use super::common::{build_runtime, start_logging, ViewArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// PNG file to write
    #[arg(long, short, default_value = "linescape.png")]
    pub output: PathBuf,

    /// Give up waiting for tiles after this many frames
    #[arg(long, default_value = "600")]
    pub max_frames: u32,
}

pub fn run(args: RenderArgs, config: ConfigFile) -> Result<(), CliError> {
    let _logging = start_logging(&config)?;
    let runtime = build_runtime()?;

    let (width, height) = (args.view.width, args.view.height);
    let mut surface = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;

    let mut viewer = args.view.build_viewer(&config, runtime.handle().clone())?;
    let info = runtime.block_on(async {
        let info = viewer.render_settled(&mut surface, args.max_frames).await;
        viewer.shutdown();
        info
    });

    save_frame(&surface, &args.output)?;
    info!(path = %args.output.display(), frames = info.frame, "Frame saved");

    println!("{}", info);
    if info.ready < info.required {
        println!(
            "Warning: {} of {} tiles did not arrive; missing tiles are left blank",
            info.required - info.ready,
            info.required
        );
    }
    println!("Saved {}", args.output.display());
    Ok(())
}
