//! EpochScript Core
//!
//! Lossless, error-tolerant and incremental parsing for EpochScript, a
//! domain-specific language for quantitative research scripts, plus a
//! projection of the resulting trees onto semantic presentation tags.
//!
//! ```
//! use epochscript_core::cst::TextEdit;
//! use epochscript_core::highlight::project_tags;
//! use epochscript_core::{parse, reparse};
//!
//! let tree = parse("prev = src.c >> 1\n");
//! assert!(!tree.has_errors());
//!
//! let tree = reparse(&tree, &[TextEdit::replace_range(16..17, "5")]).unwrap();
//! assert_eq!(tree.text(), "prev = src.c >> 5\n");
//!
//! let tags = project_tags(&tree.syntax());
//! assert_eq!(tags.at_offset(0).unwrap().1.to_string(), "definition(variableName)");
//! ```

pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod error;
pub mod highlight;
pub mod result;

// Re-export commonly used types
pub use config::{ConfigFormat, ConfigLoader, ParserConfig};
pub use cst::{
    EpochSyntaxKind, EpochSyntaxNode, ErrorOrigin, ErrorSpan, IncrementalUpdater, LANGUAGE_DATA,
    SyntaxTree, TextEdit, UpdateMetrics, UpdateResult, parse, reparse,
};
pub use error::{EpochError, ErrorKind};
pub use highlight::{Tag, TagMap, project_tags, tag_of};
pub use result::Result;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("epochscript=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
