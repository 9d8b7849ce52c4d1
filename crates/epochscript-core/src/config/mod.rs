//! Configuration for the EpochScript parser
//!
//! Configuration is optional. When present it is read from one of
//! `.epochscriptrc.toml`, `epochscript.toml`, `epochscript.yaml`,
//! `epochscript.yml` or `epochscript.json`, searched upward from the working
//! directory.
//!
//! ```toml
//! maxResyncLookahead = 64
//! maxIncrementalSize = 10000
//! incremental = true
//! ```

mod loader;
mod parser_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use parser_config::{ConfigFormat, ParserConfig};
