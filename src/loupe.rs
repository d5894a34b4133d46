//! Read-only introspection over the dispatch mapping.
//!
//! All queries are pure reads over the same persisted records the cut path
//! mutates. Absent data is an empty result, never an error.

use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;
use crate::selector::{ModuleRef, Selector, SelectorSet};
use crate::store::{StateStore, Transaction};
use crate::table::DispatchTable;

/// One live module and the selectors currently routed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetInfo {
    /// The module reference.
    pub module: ModuleRef,
    /// Selectors it owns, in the order gained.
    pub selectors: SelectorSet,
}

/// The introspection surface.
pub struct Loupe {
    store: Arc<dyn StateStore>,
}

impl Loupe {
    /// Attach to the entity's store.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    fn view(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.store))
    }

    /// All live module references, in live-list order. Never contains
    /// duplicates or a module with an empty selector set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on store failure.
    pub async fn facet_addresses(&self) -> Result<Vec<ModuleRef>, StoreError> {
        let view = self.view();
        DispatchTable::new(&view).live_modules().await
    }

    /// Selectors routed to `module`; empty if the module is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on store failure.
    pub async fn facet_function_selectors(
        &self,
        module: ModuleRef,
    ) -> Result<SelectorSet, StoreError> {
        let view = self.view();
        DispatchTable::new(&view).selectors_of(module).await
    }

    /// The module owning `selector`, or `None` if unrouted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on store failure.
    pub async fn facet_address(
        &self,
        selector: Selector,
    ) -> Result<Option<ModuleRef>, StoreError> {
        let view = self.view();
        DispatchTable::new(&view).resolve(selector).await
    }

    /// Snapshot of every live module with its selectors, in live-list order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on store failure.
    pub async fn facets(&self) -> Result<Vec<FacetInfo>, StoreError> {
        let view = self.view();
        let table = DispatchTable::new(&view);
        let mut snapshot = Vec::new();
        for module in table.live_modules().await? {
            let selectors = table.selectors_of(module).await?;
            snapshot.push(FacetInfo { module, selectors });
        }
        Ok(snapshot)
    }
}
