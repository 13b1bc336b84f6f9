//! INI → [`ConfigFile`]. The only place INI key names map to fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Overlays the values present in `ini` on the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("url") {
            let v = v.trim().trim_end_matches('/');
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("server", "url", v, "must start with http:// or https://"));
            }
            config.server.url = v.to_string();
        }
    }

    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = parse_positive(section, "fetch", "max_concurrent", "fetches")? {
            config.fetch.max_concurrent = v;
        }
        if let Some(v) = parse_value(section, "fetch", "cooldown_secs", "a whole number of seconds")? {
            config.fetch.cooldown_secs = v;
        }
        if let Some(v) = parse_positive(section, "fetch", "cache_tiles", "tiles")? {
            config.fetch.cache_tiles = v;
        }
    }

    if let Some(section) = ini.section(Some("tiling")) {
        if let Some(v) = section.get("min_tile_px") {
            config.tiling.min_tile_px = match v.trim().parse::<f64>() {
                Ok(px) if px.is_finite() && px > 0.0 => px,
                _ => return Err(invalid("tiling", "min_tile_px", v, "must be a positive number of pixels")),
            };
        }
        if let Some(v) = parse_positive(section, "tiling", "max_tiles", "tiles")? {
            config.tiling.max_tiles = v;
        }
    }

    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("layer") {
            config.render.layer = v.parse().map_err(|_| {
                invalid(
                    "render",
                    "layer",
                    v,
                    "must be one of: length, indent, offset, fileHash, fileExtension",
                )
            })?;
        }
        if let Some(v) = parse_bool(section, "render", "grid")? {
            config.render.grid = v;
        }
        if let Some(v) = parse_bool(section, "render", "debug")? {
            config.render.debug = v;
        }
        if let Some(v) = parse_bool(section, "render", "tile_borders")? {
            config.render.tile_borders = v;
        }
        if let Some(v) = parse_positive(section, "render", "fps", "frames per second")? {
            config.render.fps = v;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, ConfigFileError> {
    section
        .get(key)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| invalid(name, key, v, &format!("must be {}", expected)))
        })
        .transpose()
}

fn parse_positive<T: FromStr + PartialOrd + Default>(
    section: &Properties,
    name: &str,
    key: &str,
    unit: &str,
) -> Result<Option<T>, ConfigFileError> {
    let expected = format!("a positive integer ({})", unit);
    match parse_value::<T>(section, name, key, &expected)? {
        Some(v) if v <= T::default() => Err(invalid(
            name,
            key,
            section.get(key).unwrap_or_default(),
            &format!("must be {}", expected),
        )),
        other => Ok(other),
    }
}

fn parse_bool(section: &Properties, name: &str, key: &str) -> Result<Option<bool>, ConfigFileError> {
    section
        .get(key)
        .map(|v| match v.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(name, key, v, "must be true or false")),
        })
        .transpose()
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::VisualizationLayer;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_ignores_retired_server_timeout() {
        let config = parse("[server]\ntimeout = 5\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_overlays_present_values() {
        let config = parse(
            "[server]\nurl = https://lines.example.com/\n\
             [fetch]\nmax_concurrent = 2\ncooldown_secs = 0\n\
             [tiling]\nmin_tile_px = 128.5\n\
             [render]\nlayer = fileHash\ngrid = off\ndebug = yes\nfps = 30\n",
        )
        .unwrap();

        assert_eq!(config.server.url, "https://lines.example.com");
        assert_eq!(config.fetch.max_concurrent, 2);
        assert_eq!(config.fetch.cooldown_secs, 0);
        assert_eq!(config.fetch.cache_tiles, 1024);
        assert_eq!(config.tiling.min_tile_px, 128.5);
        assert_eq!(config.tiling.max_tiles, 100);
        assert_eq!(config.render.layer, VisualizationLayer::FILE_HASH);
        assert!(!config.render.grid);
        assert!(config.render.debug);
        assert_eq!(config.render.fps, 30);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases = [
            ("[server]\nurl = ftp://x\n", "url"),
            ("[fetch]\nmax_concurrent = -1\n", "max_concurrent"),
            ("[tiling]\nmin_tile_px = NaN\n", "min_tile_px"),
            ("[render]\nlayer = stack\n", "layer"),
            ("[render]\ngrid = maybe\n", "grid"),
        ];
        for (text, expected_key) in cases {
            match parse(text) {
                Err(ConfigFileError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("{:?} parsed as {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log/x.log"), PathBuf::from("/var/log/x.log"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x.log"), home.join("x.log"));
        }
    }
}
