//! Install-once storage for executable definitions.

use core::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::WeavingError;
use crate::symbol::SymbolId;

/// Holds the installed definition of one symbol.
///
/// A slot accepts a single definition. Installing the very same definition
/// again is a no-op; installing a different one fails with
/// [`WeavingError::NotConfigurable`].
pub struct Slot<T: ?Sized> {
    definition: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Slot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            definition: RwLock::new(None),
        }
    }

    /// Returns the installed definition.
    ///
    /// The read lock is released before returning, so callers may run the
    /// definition without holding it.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.definition.read().clone()
    }

    /// Whether a definition is installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.definition.read().is_some()
    }

    /// Installs `definition` for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`WeavingError::NotConfigurable`] if a different definition is
    /// already installed.
    pub fn install(&self, symbol: &SymbolId, definition: Arc<T>) -> Result<(), WeavingError> {
        let mut slot = self.definition.write();
        match slot.as_ref() {
            Some(existing) if Arc::ptr_eq(existing, &definition) => Ok(()),
            Some(_) => {
                tracing::warn!(%symbol, "refusing to overwrite installed definition");
                Err(WeavingError::NotConfigurable {
                    symbol: symbol.to_string(),
                })
            }
            None => {
                *slot = Some(definition);
                Ok(())
            }
        }
    }
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("installed", &self.is_installed())
            .finish()
    }
}
