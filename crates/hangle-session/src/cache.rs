//! Remote property lists keyed by context expression.

use std::collections::HashMap;

use hangle_core::{
    CommandChannel, ObjectProperty, RelayError, property::parse_describe,
    protocol::describe_command,
};

/// Cache of `__DESCRIBE` results.
///
/// Entries describe mutable remote state, so the whole cache is dropped
/// after every executed command rather than entry by entry.
#[derive(Debug, Default)]
pub struct IntrospectionCache {
    entries: HashMap<String, Vec<ObjectProperty>>,
}

impl IntrospectionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties of `context`, fetched through `channel` on a miss.
    ///
    /// A malformed response is cached as an empty list.
    ///
    /// # Errors
    /// Returns error only if the relay itself fails.
    pub async fn lookup<C>(
        &mut self,
        channel: &C,
        context: &str,
    ) -> Result<&[ObjectProperty], RelayError>
    where
        C: CommandChannel + ?Sized,
    {
        if !self.entries.contains_key(context) {
            let body = channel.send_command(&describe_command(context)).await?;
            let properties = parse_describe(&body).unwrap_or_else(|e| {
                tracing::warn!(%context, "Malformed describe response: {e}");
                Vec::new()
            });
            self.entries.insert(context.to_string(), properties);
        }
        Ok(self.entries.get(context).map_or(&[][..], Vec::as_slice))
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    /// Whether `context` is cached.
    #[must_use]
    pub fn contains(&self, context: &str) -> bool {
        self.entries.contains_key(context)
    }

    /// Number of cached contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
