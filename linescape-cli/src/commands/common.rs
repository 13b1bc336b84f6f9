//! Arguments and setup shared by the commands.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use linescape::config::ConfigFile;
use linescape::coord::LayoutError;
use linescape::fetch::{HttpTileSource, TileSource};
use linescape::logging::{init_logging, split_log_path, LoggingGuard};
use linescape::{FileIndex, TileLayout, Viewer, VisualizationLayer};
use tokio::runtime::{Handle, Runtime};
use tracing::info;

use crate::error::CliError;

/// Where the snapshot size comes from.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct LayoutArgs {
    /// Total number of lines in the snapshot
    #[arg(long)]
    pub lines: Option<u64>,

    /// File index JSON ({"entries": [...]}) as served for the commit
    #[arg(long)]
    pub index: Option<PathBuf>,
}

impl LayoutArgs {
    /// Builds the layout, plus the file index when one was given.
    pub fn load(&self) -> Result<(TileLayout, Option<FileIndex>), CliError> {
        if let Some(path) = &self.index {
            let index_error = |error: String| CliError::Index {
                path: path.display().to_string(),
                error,
            };
            let json = fs::read_to_string(path).map_err(|e| index_error(e.to_string()))?;
            let index = FileIndex::from_json(&json).map_err(|e| index_error(e.to_string()))?;
            let layout = TileLayout::from_entries(index.entries())?;
            return Ok((layout, Some(index)));
        }

        match self.lines {
            Some(lines) if lines > 0 => Ok((TileLayout::new(lines), None)),
            _ => Err(LayoutError::NoEntities.into()),
        }
    }
}

/// The snapshot to draw and how to draw it.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Repository name as known to the tile server
    pub repo: String,

    /// Resolved commit hash
    pub commit: String,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Visualization layer (length, indent, offset, filehash, fileextension)
    #[arg(long)]
    pub layer: Option<VisualizationLayer>,

    /// Surface width in pixels
    #[arg(long, default_value = "1024")]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "768")]
    pub height: u32,

    /// Draw the debug overlay (grid bounds and origin)
    #[arg(long)]
    pub debug: bool,

    /// Outline every drawn tile
    #[arg(long)]
    pub tile_borders: bool,
}

impl ViewArgs {
    /// Builds a viewer fetching from the configured server.
    pub fn build_viewer(&self, config: &ConfigFile, runtime: Handle) -> Result<Viewer, CliError> {
        let (layout, index) = self.layout.load()?;
        let source = Arc::new(HttpTileSource::new(config.server.url.clone())?);
        let tiles: Arc<dyn TileSource> = source.clone();

        let mut viewer = Viewer::new(
            self.repo.as_str(),
            self.commit.as_str(),
            layout,
            tiles,
            config.to_viewer_config(),
            runtime,
        );
        if let Some(index) = index {
            viewer = viewer.with_index(index).with_outlines(source);
        }

        viewer.set_layer(self.layer.unwrap_or(config.render.layer));
        let render = viewer.render_config_mut();
        render.debug |= self.debug;
        render.tile_borders |= self.tile_borders;

        info!(
            repo = %self.repo,
            commit = %self.commit,
            lines = viewer.layout().line_count(),
            layer = %viewer.layer(),
            server = %config.server.url,
            "Viewer ready"
        );
        Ok(viewer)
    }
}

/// Starts file and stdout logging at the configured path.
pub fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    let (dir, file) = split_log_path(&config.logging.file);
    init_logging(&dir, &file).map_err(|e| CliError::LoggingInit(e.to_string()))
}

pub fn build_runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}
