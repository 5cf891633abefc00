use std::collections::HashMap;

use crate::error::{ItemKind, LayoutError};

/// Name-keyed definitions of one item kind.
///
/// Definitions live for the engine's lifetime and change only between
/// layout passes.
#[derive(Clone, Debug)]
pub struct Registry<T> {
    kind: ItemKind,
    items: HashMap<String, T>,
}

impl<T> Registry<T> {
    /// Create an empty registry for `kind`.
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Register `item` under a new name.
    ///
    /// Fails with [`LayoutError::DuplicateName`] when the name is taken; the
    /// existing registration is left untouched.
    pub fn register(&mut self, name: impl Into<String>, item: T) -> Result<(), LayoutError> {
        let name = self.checked_name(name)?;
        if self.items.contains_key(&name) {
            return Err(LayoutError::DuplicateName {
                kind: self.kind,
                name,
            });
        }
        self.items.insert(name, item);
        Ok(())
    }

    /// Register `item`, overwriting any existing definition.
    ///
    /// Returns the previous definition.
    pub fn replace(&mut self, name: impl Into<String>, item: T) -> Result<Option<T>, LayoutError> {
        let name = self.checked_name(name)?;
        let previous = self.items.insert(name, item);
        if previous.is_some() {
            log::debug!("replaced registered {}", self.kind);
        }
        Ok(previous)
    }

    /// Remove the definition for `name`, returning whether it existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.items.remove(name).is_some()
    }

    /// Definition for `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.get(name)
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Definition for `name`, or [`LayoutError::UnrecognizedName`].
    pub fn resolve(&self, name: &str) -> Result<&T, LayoutError> {
        self.items
            .get(name)
            .ok_or_else(|| LayoutError::UnrecognizedName {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    fn checked_name(&self, name: impl Into<String>) -> Result<String, LayoutError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LayoutError::EmptyName { kind: self.kind });
        }
        Ok(name)
    }
}
