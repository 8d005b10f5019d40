//! Update function for the Elm-style architecture
//!
//! Maps a [`CaretMsg`] onto the caret operation it names. The caret and its
//! document are never mutated; the host swaps in whatever [`Edit`] comes back.

use crate::caret::{Caret, Edit, Layout, Position};
use crate::config::EditConfig;
use crate::messages::CaretMsg;
use crate::revision::{Refer, Revision};
use crate::tracing::CaretSnapshot;

/// What the update function needs beyond the caret
pub struct Context<'a> {
    pub config: &'a EditConfig,
    pub layout: &'a dyn Layout,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a EditConfig, layout: &'a dyn Layout) -> Self {
        Self { config, layout }
    }
}

/// Main update function - dispatches to caret operations
pub fn update(caret: &Caret, msg: &CaretMsg, ctx: &Context<'_>) -> Option<Edit> {
    let result = match msg {
        CaretMsg::Left { by_sibling } => caret.left(*by_sibling).map(Edit::Caret),
        CaretMsg::Right { by_sibling } => caret.right(*by_sibling).map(Edit::Caret),
        CaretMsg::Vertical { direction } => caret.move_vertical(*direction, ctx.layout).map(Edit::Caret),
        CaretMsg::Home => caret.home().map(Edit::Caret),
        CaretMsg::End => caret.end().map(Edit::Caret),
        CaretMsg::SetOffset { offset } => {
            (*offset <= caret.source().len()).then(|| Edit::Caret(caret.with_offset(*offset)))
        }
        CaretMsg::Enter => caret.enter().map(Edit::Caret),
        CaretMsg::Exit => caret.exit().map(Edit::Caret),
        CaretMsg::Insert { text } => caret.insert(text, ctx.config),
        CaretMsg::Backspace => caret.backspace(),
        CaretMsg::Delete => caret.delete(),
        CaretMsg::Wrap { key } => caret.wrap(key),
        CaretMsg::Replace { text } => match caret.position() {
            Position::Node(node) => caret.replace(node, text),
            Position::Offset(_) => None,
        },
        CaretMsg::Refer {
            name,
            operator_form,
        } => refer(caret, name, *operator_form, ctx.config),
    };

    match &result {
        Some(edit) => {
            let before = CaretSnapshot::from_caret(caret);
            let after = CaretSnapshot::from_caret(edit.caret());
            if let Some(diff) = before.diff(&after) {
                tracing::debug!(?msg, %diff, "caret updated");
            }
        }
        None => tracing::debug!(?msg, "no-op"),
    }
    result
}

fn refer(caret: &Caret, name: &str, operator_form: bool, config: &EditConfig) -> Option<Edit> {
    let Position::Node(node) = caret.position() else {
        return None;
    };
    let refer = Refer::named(caret.source(), name, operator_form)?;
    Revision::replace(caret.source(), node, refer).edit_with(config)
}
