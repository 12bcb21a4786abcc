//! String-keyed factory registry

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::RegistryError;

/// Registry of provider factories keyed by id.
///
/// `F` is usually a trait object such as `dyn SecretsProviderFactory`.
pub struct Registry<F: ?Sized> {
    kind: &'static str,
    factories: HashMap<String, Arc<F>>,
}

impl<F: ?Sized> Registry<F> {
    /// Create an empty registry; `kind` labels it in logs and errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register a factory, returning the one it replaced (if any)
    pub fn register(&mut self, id: impl Into<String>, factory: Arc<F>) -> Option<Arc<F>> {
        let id = id.into();
        let previous = self.factories.insert(id.clone(), factory);

        if previous.is_some() {
            warn!(kind = self.kind, id = %id, "Replacing registered provider factory");
        } else {
            debug!(kind = self.kind, id = %id, "Registered provider factory");
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<Arc<F>> {
        self.factories.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Look up a factory, failing with the list of known ids
    pub fn resolve(&self, id: &str) -> Result<Arc<F>, RegistryError> {
        self.get(id).ok_or_else(|| RegistryError::UnknownProvider {
            kind: self.kind,
            id: id.to_string(),
            available: self.ids(),
        })
    }
}
