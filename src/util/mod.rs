//! Utility modules

pub mod text;

// Re-export text utilities at the util level
pub use text::{
    closer_for, grapheme_count, is_closing_delimiter, is_opening_delimiter, is_operator,
    is_reserved, is_space, normalize, opener_for, split_at_grapheme, text_closer_for,
};
