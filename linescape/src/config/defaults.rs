//! Default values for every configuration setting.

use std::time::Duration;

use super::file::config_directory;
use super::settings::*;
use crate::camera::CameraConfig;
use crate::fetch::FetchConfig;
use crate::layer::VisualizationLayer;
use crate::quadtree::TilingConfig;
use crate::render::{RenderConfig, ViewerConfig};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

pub const DEFAULT_MAX_CONCURRENT: usize = 6;
pub const DEFAULT_COOLDOWN_SECS: u64 = 10;
pub const DEFAULT_CACHE_TILES: u64 = 1024;

pub const DEFAULT_MIN_TILE_PX: f64 = 256.0;
pub const DEFAULT_MAX_TILES: usize = 100;

pub const DEFAULT_FPS: u32 = 60;
pub const MAX_FPS: u32 = 240;

pub const DEFAULT_LOG_FILE: &str = "linescape.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                url: DEFAULT_SERVER_URL.to_string(),
            },
            fetch: FetchSettings {
                max_concurrent: DEFAULT_MAX_CONCURRENT,
                cooldown_secs: DEFAULT_COOLDOWN_SECS,
                cache_tiles: DEFAULT_CACHE_TILES,
            },
            tiling: TilingSettings {
                min_tile_px: DEFAULT_MIN_TILE_PX,
                max_tiles: DEFAULT_MAX_TILES,
            },
            render: RenderSettings {
                layer: VisualizationLayer::default(),
                grid: true,
                debug: false,
                tile_borders: false,
                fps: DEFAULT_FPS,
            },
            logging: LoggingSettings {
                file: config_directory().join(DEFAULT_LOG_FILE),
            },
        }
    }
}

impl ConfigFile {
    /// Library configuration for a viewer built from these settings.
    pub fn to_viewer_config(&self) -> ViewerConfig {
        let fps = self.render.fps.clamp(1, MAX_FPS);
        ViewerConfig {
            camera: CameraConfig::default(),
            tiling: TilingConfig {
                min_tile_px: self.tiling.min_tile_px,
                max_tiles: self.tiling.max_tiles,
            },
            fetch: FetchConfig {
                max_concurrent: self.fetch.max_concurrent,
                failure_cooldown: Duration::from_secs(self.fetch.cooldown_secs),
                cache_capacity: self.fetch.cache_tiles,
            },
            render: RenderConfig {
                grid: self.render.grid,
                debug: self.render.debug,
                tile_borders: self.render.tile_borders,
                frame_interval: Duration::from_secs(1) / fps,
                ..RenderConfig::default()
            },
        }
    }
}
