//! Facet code interface and the process-local code binder.
//!
//! A facet supplies code only; the entity supplies the storage and identity
//! the code runs against. Delegation hands the facet a [`Transaction`] over
//! the entity's own records — never module-private state — scoped to the
//! current invocation: its writes land only if the invocation succeeds.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::warn;

use crate::selector::{ModuleRef, Selector};
use crate::store::Transaction;

/// Code behind a module reference.
///
/// The registry never inspects a facet's behavior, only its selector
/// surface; errors returned here propagate to the original caller
/// unchanged.
#[async_trait]
pub trait Facet: Send + Sync {
    /// Execute the function named by `selector` with raw `args` against the
    /// entity's state.
    ///
    /// # Errors
    ///
    /// Any error aborts the invocation; staged writes are discarded.
    async fn execute(
        &self,
        selector: Selector,
        args: &[u8],
        state: &Transaction,
    ) -> anyhow::Result<Vec<u8>>;

    /// One-time initialization hook, run inside the same atomic unit as the
    /// cut that requested it. Default: nothing to initialize.
    ///
    /// # Errors
    ///
    /// Any error rolls back the entire cut.
    async fn init(&self, _payload: &[u8], _state: &Transaction) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Process-local map from module reference to deployed facet code.
///
/// The mapping in the store is the durable truth about *which* module owns a
/// selector; the binder holds the code those references resolve to in this
/// process.
pub struct FacetBinder {
    facets: RwLock<HashMap<ModuleRef, Arc<dyn Facet>>>,
}

impl FacetBinder {
    /// Create an empty binder.
    pub fn new() -> Self {
        Self {
            facets: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `code` as the implementation of `module`, replacing any previous
    /// binding.
    pub fn bind(&self, module: ModuleRef, code: Arc<dyn Facet>) {
        if let Ok(mut map) = self.facets.write() {
            map.insert(module, code);
        } else {
            warn!(module = %module, "facet binder lock poisoned in bind");
        }
    }

    /// Drop the binding for `module`, if any.
    pub fn unbind(&self, module: ModuleRef) {
        if let Ok(mut map) = self.facets.write() {
            map.remove(&module);
        } else {
            warn!(module = %module, "facet binder lock poisoned in unbind");
        }
    }

    /// The code bound to `module`, if any.
    pub fn code_for(&self, module: ModuleRef) -> Option<Arc<dyn Facet>> {
        match self.facets.read() {
            Ok(map) => map.get(&module).cloned(),
            Err(_) => {
                warn!(module = %module, "facet binder lock poisoned in code_for");
                None
            }
        }
    }
}

impl Default for FacetBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FacetBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = match self.facets.read() {
            Ok(map) => map.len(),
            Err(_) => 0,
        };
        f.debug_struct("FacetBinder").field("bound", &count).finish()
    }
}
