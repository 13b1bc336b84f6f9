//! [`ConfigFile`] → commented INI text.

use std::path::Path;

use super::settings::ConfigFile;

/// Renders the config as the commented INI written to `config.ini`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[server]
; Base URL of the tile server
url = {}

[fetch]
; Maximum raw tile fetches in flight at once (default: 6)
max_concurrent = {}
; Seconds without new fetches after a failed one (default: 10)
cooldown_secs = {}
; Decoded tiles kept in memory (default: 1024)
cache_tiles = {}

[tiling]
; Tiles narrower than this on screen are not refined (default: 256)
min_tile_px = {}
; Maximum tiles requested per frame (default: 100)
max_tiles = {}

[render]
; Layer shown at startup: length, indent, offset, fileHash, fileExtension
layer = {}
; Draw the cell grid when zoomed in
grid = {}
; Origin marker and grid bounds
debug = {}
; Outline every requested tile
tile_borders = {}
; Frames per second of the render loop (default: 60)
fps = {}

[logging]
; Log file, cleared at every start
file = {}
"#,
        config.server.url,
        config.fetch.max_concurrent,
        config.fetch.cooldown_secs,
        config.fetch.cache_tiles,
        config.tiling.min_tile_px,
        config.tiling.max_tiles,
        config.render.layer.kind,
        config.render.grid,
        config.render.debug,
        config.render.tile_borders,
        config.render.fps,
        path_to_string(&config.logging.file),
    )
}

/// Path as text, with the home directory collapsed to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
