//! Configuration file handling for `~/.linescape/config.ini`.
//!
//! - `settings`: one struct per `[section]`
//! - `defaults`: `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser`: INI → [`ConfigFile`], validating every value
//! - `writer`: [`ConfigFile`] → commented INI
//! - `file`: loading, saving and the default paths

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, FetchSettings, LoggingSettings, RenderSettings, ServerSettings, TilingSettings,
};
