//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

use crate::layer::VisualizationLayer;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub fetch: FetchSettings,
    pub tiling: TilingSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

/// Tile server connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Base URL, without trailing slash.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub max_concurrent: usize,
    /// Pause after a failed fetch, in seconds.
    pub cooldown_secs: u64,
    /// Decoded tiles kept in memory.
    pub cache_tiles: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilingSettings {
    pub min_tile_px: f64,
    pub max_tiles: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Layer shown at startup.
    pub layer: VisualizationLayer,
    pub grid: bool,
    pub debug: bool,
    pub tile_borders: bool,
    /// Frames per second of the render loop.
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
