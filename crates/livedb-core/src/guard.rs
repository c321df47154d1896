//! Per-statement registry of bind placeholders.

use std::collections::HashSet;

use crate::condition::Condition;
use crate::error::BuildError;

/// Tracks the placeholders registered while a single statement is built.
///
/// Two bindable entries sharing a placeholder would silently overwrite
/// each other's value on the prepared statement, so the second one is
/// rejected.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderGuard {
    registered: HashSet<String>,
}

impl PlaceholderGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `placeholder` unless `exempt` is set.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePlaceholder`] if a non-exempt entry
    /// already registered the same name. Nothing is registered on error.
    pub fn check_and_register(
        &mut self,
        placeholder: &str,
        exempt: bool,
    ) -> Result<(), BuildError> {
        if exempt {
            return Ok(());
        }
        if !self.registered.insert(placeholder.to_owned()) {
            return Err(BuildError::DuplicatePlaceholder(placeholder.to_owned()));
        }
        Ok(())
    }

    /// Registers every placeholder a normalized condition binds under.
    ///
    /// Range operators bind a second value under `<name>2`, which is
    /// reserved as well. Either both names are registered or neither.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicatePlaceholder`] on a clash.
    pub fn register_condition(&mut self, condition: &Condition) -> Result<(), BuildError> {
        let exempt = condition.is_guard_exempt();
        let Some(name) = condition.effective_placeholder() else {
            return Ok(());
        };
        if exempt {
            return Ok(());
        }
        if condition.operator().is_range() {
            let upper = format!("{name}2");
            if self.contains(name) {
                return Err(BuildError::DuplicatePlaceholder(name.to_owned()));
            }
            if self.contains(&upper) {
                return Err(BuildError::DuplicatePlaceholder(upper));
            }
            self.check_and_register(name, false)?;
            return self.check_and_register(&upper, false);
        }
        self.check_and_register(name, false)
    }

    /// Frees `placeholder` so a later entry may take it. Returns `false`
    /// if it was not registered.
    pub fn release(&mut self, placeholder: &str) -> bool {
        self.registered.remove(placeholder)
    }

    #[must_use]
    pub fn contains(&self, placeholder: &str) -> bool {
        self.registered.contains(placeholder)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}
