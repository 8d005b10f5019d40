//! Message types for the Elm-style architecture
//!
//! Every caret interaction a host can request is a [`CaretMsg`]. Messages are
//! plain data, so scripts of them can be stored as YAML and replayed.

use serde::{Deserialize, Serialize};

use crate::caret::VerticalDirection;

/// Caret navigation and editing requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CaretMsg {
    // === Movement ===
    /// Move left; with `by_sibling`, a selection moves to its previous sibling
    Left {
        #[serde(default)]
        by_sibling: bool,
    },
    /// Move right; with `by_sibling`, a selection moves to its next sibling
    Right {
        #[serde(default)]
        by_sibling: bool,
    },
    /// Move to the visually closest position on an adjacent line
    Vertical { direction: VerticalDirection },
    /// Start of the line
    Home,
    /// End of the line
    End,
    /// Put the caret at a grapheme offset
    SetOffset { offset: usize },

    // === Selection ===
    /// Descend into the selection
    Enter,
    /// Select the token at the caret, or the parent of the selection
    Exit,

    // === Editing ===
    /// Type text
    Insert { text: String },
    /// Delete backwards
    Backspace,
    /// Delete forwards
    Delete,
    /// Wrap the selection in `(` or `[`
    Wrap { key: String },
    /// Replace the selection's text
    Replace { text: String },
    /// Replace the selection with a reference to the definition called `name`
    Refer {
        name: String,
        #[serde(default)]
        operator_form: bool,
    },
}
