//! Property completion for dotted expressions.

use async_trait::async_trait;
use hangle_core::ObjectProperty;

/// Characters that end a completion chain. `.` is absent so dotted
/// expressions stay in one piece.
pub const CHAIN_SEPARATORS: &str = "!@#$%^&*()+-={}|\\:;<>?,/~ \t";

/// Characters that end a word for the line editor's word motions.
/// Broader than `CHAIN_SEPARATORS`: stops at `.`, `_`, brackets and
/// quotes.
pub const WORD_SEPARATORS: &str = "!@#$%^&*()_+-={}|[]\\:\";'<>?,./~` \t";

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Text inserted in place of the current word.
    pub text: String,
    /// Shown next to the candidate (the remote type).
    pub description: String,
}

impl From<&ObjectProperty> for Suggestion {
    fn from(property: &ObjectProperty) -> Self {
        Self {
            text: property.name.clone(),
            description: property.declared_type.clone(),
        }
    }
}

/// Trait for completion sources driven by the line editor.
#[async_trait]
pub trait Completer: Send {
    /// Suggestions for the text before the cursor.
    async fn complete(&mut self, before_cursor: &str) -> Vec<Suggestion>;
}

/// Text after the last character of `separators` in `before_cursor`.
#[must_use]
pub fn word_until_separator<'a>(before_cursor: &'a str, separators: &str) -> &'a str {
    before_cursor
        .rfind(|c| separators.contains(c))
        .map_or(before_cursor, |i| {
            let sep_len = before_cursor[i..].chars().next().map_or(1, char::len_utf8);
            &before_cursor[i + sep_len..]
        })
}

/// The dotted chain immediately before the cursor.
#[must_use]
pub fn extract_chain(before_cursor: &str) -> &str {
    word_until_separator(before_cursor, CHAIN_SEPARATORS)
}

/// The word the editor replaces when a suggestion is accepted.
#[must_use]
pub fn current_word(before_cursor: &str) -> &str {
    word_until_separator(before_cursor, WORD_SEPARATORS)
}

/// Text a chosen suggestion replaces: the filter after the last `.` of
/// the chain, or the current word when there is no chain.
#[must_use]
pub fn completion_target(before_cursor: &str) -> &str {
    split_chain(extract_chain(before_cursor))
        .map_or_else(|| current_word(before_cursor), |(_, filter)| filter)
}

/// Split a chain on its last `.` into `(context, filter)`.
///
/// Returns `None` if there is no `.` or nothing before it.
#[must_use]
pub fn split_chain(chain: &str) -> Option<(&str, &str)> {
    chain
        .rsplit_once('.')
        .filter(|(context, _)| !context.is_empty())
}

/// Properties whose name contains `filter`, ignoring case, in the given
/// order.
#[must_use]
pub fn filter_properties(properties: &[ObjectProperty], filter: &str) -> Vec<Suggestion> {
    let needle = filter.to_lowercase();
    properties
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .map(Suggestion::from)
        .collect()
}
