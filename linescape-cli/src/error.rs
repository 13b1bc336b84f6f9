//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use linescape::config::ConfigFileError;
use linescape::coord::{CoordError, LayoutError};
use linescape::fetch::FetchError;
use linescape::render::RenderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Invalid or unreadable configuration
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Index file could not be read or parsed
    Index { path: String, error: String },
    /// The index or line count describes an empty snapshot
    Layout(LayoutError),
    /// A line, cell or tile outside the grid
    Coord(CoordError),
    /// Failed to set up the tile server client
    Source(FetchError),
    /// Failed to draw or save a frame
    Render(RenderError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Layout(_) => {
                eprintln!();
                eprintln!("Pass --lines with a positive count, or --index with a non-empty index.");
            }
            CliError::Source(_) => {
                eprintln!();
                eprintln!("Check [server] url in the config file (linescape config path).");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Index { path, error } => {
                write!(f, "Failed to load index '{}': {}", path, error)
            }
            CliError::Layout(e) => write!(f, "Cannot lay out snapshot: {}", e),
            CliError::Coord(e) => write!(f, "{}", e),
            CliError::Source(e) => write!(f, "Failed to create tile source: {}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Layout(e) => Some(e),
            CliError::Coord(e) => Some(e),
            CliError::Source(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LayoutError> for CliError {
    fn from(e: LayoutError) -> Self {
        CliError::Layout(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coord(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Source(e)
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Render(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_cause() {
        let err = CliError::Layout(LayoutError::NoEntities);
        assert_eq!(err.to_string(), "Cannot lay out snapshot: index contains no entities");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_index_error_names_path() {
        let err = CliError::Index {
            path: "index.json".to_string(),
            error: "expected value".to_string(),
        };
        assert!(err.to_string().contains("index.json"));
        assert!(err.source().is_none());
    }
}
