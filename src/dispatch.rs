//! Call routing: selector → owning facet, run against entity state.
//!
//! Each dispatched call resolves its owning module, fetches the bound code,
//! and delegates inside a fresh [`Transaction`] over the entity's records.
//! Success commits the call's staged writes; a facet failure discards them
//! and propagates unchanged. There is no fallback routing and no recovery.

use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::facet::FacetBinder;
use crate::selector::{ModuleRef, Selector};
use crate::store::{StateStore, Transaction};
use crate::table::DispatchTable;

/// The call-routing front door.
pub struct Dispatcher {
    store: Arc<dyn StateStore>,
    binder: Arc<FacetBinder>,
}

impl Dispatcher {
    /// Create a dispatcher over the entity's store and code binder.
    pub fn new(store: Arc<dyn StateStore>, binder: Arc<FacetBinder>) -> Self {
        Self { store, binder }
    }

    /// Route one call to the facet owning `selector`.
    ///
    /// `caller` is carried for observability only; dispatch requires no
    /// authorization.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::FunctionNotFound`] if no module owns `selector`.
    /// - [`RegistryError::ModuleNotBound`] if the owner has no code bound in
    ///   this process.
    /// - [`RegistryError::Facet`] carrying the delegated code's own failure,
    ///   unchanged; the call's staged writes are discarded.
    pub async fn dispatch(
        &self,
        caller: ModuleRef,
        selector: Selector,
        args: &[u8],
    ) -> Result<Vec<u8>, RegistryError> {
        let tx = Transaction::new(Arc::clone(&self.store));
        let module = DispatchTable::new(&tx)
            .resolve(selector)
            .await?
            .ok_or(RegistryError::FunctionNotFound(selector))?;
        let code = self
            .binder
            .code_for(module)
            .ok_or(RegistryError::ModuleNotBound(module))?;

        debug!(selector = %selector, module = %module, caller = %caller, "dispatching");

        let output = code.execute(selector, args, &tx).await?;
        tx.commit().await?;
        Ok(output)
    }
}
