//! CLI command implementations.
//!
//! - `render`: one settled frame to PNG
//! - `run`: the live frame loop, headless
//! - `locate`: coordinate conversions
//! - `config`: config file management

pub mod common;
pub mod config;
pub mod locate;
pub mod render;
pub mod run;
