//! Sprig - structural code editing core
//!
//! This crate provides carets that navigate and edit an immutable syntax
//! tree, revisions that describe tree edits, and the whitespace model that
//! keeps a document's text intact across both, following the Elm
//! Architecture pattern for the command layer.

pub mod caret;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod locale;
pub mod messages;
pub mod revision;
pub mod source;
pub mod tracing;
pub mod update;
pub mod util;

// Re-export commonly used types
pub use caret::{Caret, Edit, Layout, MonospaceLayout, Position};
pub use config::EditConfig;
pub use locale::Locales;
pub use messages::CaretMsg;
pub use revision::{Insertion, Refer, Revision};
pub use source::{Node, NodeId, NodeKind, Source};
