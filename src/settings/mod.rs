//! Startup configuration: a TOML file chosen by `--settings`, overlaid with
//! `HUBGATE__SECTION__KEY` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
