//! Atomic batch mutation of the dispatch mapping.
//!
//! A cut is an ordered sequence of Add/Replace/Remove entries, optionally
//! followed by one initialization call, applied as a single all-or-nothing
//! unit. All mutations are staged in one [`Transaction`]; the init hook runs
//! against the same staged view, so a failure anywhere — validation, store,
//! or init code — means nothing commits.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::RegistryError;
use crate::facet::FacetBinder;
use crate::ownership::OwnershipGuard;
use crate::selector::{ModuleRef, Selector};
use crate::store::{StateStore, Transaction};
use crate::table::DispatchTable;

/// What a cut entry does with its selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAction {
    /// Route selectors that currently have no owner.
    Add,
    /// Re-route selectors from their current owner to a different module.
    Replace,
    /// Unroute selectors; the entry's module must be the null reference.
    Remove,
}

/// One entry in a cut batch.
#[derive(Debug, Clone)]
pub struct FacetCut {
    /// Target module: the new owner for Add/Replace, the null reference for
    /// Remove.
    pub module: ModuleRef,
    /// What to do with the selectors.
    pub action: CutAction,
    /// Selectors the action applies to. Must be non-empty.
    pub selectors: Vec<Selector>,
}

impl FacetCut {
    /// Convenience constructor.
    pub fn new(module: ModuleRef, action: CutAction, selectors: Vec<Selector>) -> Self {
        Self {
            module,
            action,
            selectors,
        }
    }
}

/// Applies cut batches as single atomic units.
pub struct CutProcessor {
    store: Arc<dyn StateStore>,
    binder: Arc<FacetBinder>,
    guard: OwnershipGuard,
}

impl CutProcessor {
    /// Create a processor over the entity's store and code binder.
    pub fn new(store: Arc<dyn StateStore>, binder: Arc<FacetBinder>) -> Self {
        let guard = OwnershipGuard::new(Arc::clone(&store));
        Self {
            store,
            binder,
            guard,
        }
    }

    /// Apply `cuts` strictly in order, run the optional init hook, then
    /// commit everything as one batch.
    ///
    /// `init` is `(target, payload)`; a null target skips the hook without
    /// error.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Unauthorized`] if `caller` is not the owner
    ///   (checked before anything is staged).
    /// - [`RegistryError::EmptySelectorList`], [`RegistryError::AddToNullModule`],
    ///   [`RegistryError::RemoveModuleMustBeNull`],
    ///   [`RegistryError::SelectorAlreadyExists`],
    ///   [`RegistryError::SelectorNotFound`],
    ///   [`RegistryError::ReplaceWithSameModule`] per the entry rules.
    /// - [`RegistryError::ModuleNotBound`] if the init target has no code.
    /// - [`RegistryError::InitializationFailed`] if the init hook fails.
    ///
    /// On any error the whole cut is discarded; no earlier entry's mutation
    /// survives.
    pub async fn apply_cut(
        &self,
        caller: ModuleRef,
        cuts: &[FacetCut],
        init: Option<(ModuleRef, &[u8])>,
    ) -> Result<(), RegistryError> {
        self.guard.ensure_owner(caller).await?;

        let tx = Transaction::new(Arc::clone(&self.store));
        let table = DispatchTable::new(&tx);

        for cut in cuts {
            self.apply_entry(&table, cut).await?;
            debug!(
                module = %cut.module,
                action = ?cut.action,
                selectors = cut.selectors.len(),
                "cut entry staged"
            );
        }

        if let Some((target, payload)) = init {
            if !target.is_null() {
                let code = self
                    .binder
                    .code_for(target)
                    .ok_or(RegistryError::ModuleNotBound(target))?;
                code.init(payload, &tx)
                    .await
                    .map_err(|reason| RegistryError::InitializationFailed { target, reason })?;
                debug!(target = %target, "initialization hook succeeded");
            }
        }

        tx.commit().await?;
        info!(entries = cuts.len(), caller = %caller, "cut committed");
        Ok(())
    }

    /// Validate and stage one cut entry.
    async fn apply_entry(
        &self,
        table: &DispatchTable<'_>,
        cut: &FacetCut,
    ) -> Result<(), RegistryError> {
        if cut.selectors.is_empty() {
            return Err(RegistryError::EmptySelectorList { module: cut.module });
        }
        match cut.action {
            CutAction::Add => {
                if cut.module.is_null() {
                    return Err(RegistryError::AddToNullModule);
                }
                for &selector in &cut.selectors {
                    if let Some(owner) = table.resolve(selector).await? {
                        return Err(RegistryError::SelectorAlreadyExists { selector, owner });
                    }
                    table.set(selector, cut.module).await?;
                }
            }
            CutAction::Replace => {
                if cut.module.is_null() {
                    return Err(RegistryError::AddToNullModule);
                }
                for &selector in &cut.selectors {
                    let owner = table
                        .resolve(selector)
                        .await?
                        .ok_or(RegistryError::SelectorNotFound(selector))?;
                    if owner == cut.module {
                        return Err(RegistryError::ReplaceWithSameModule {
                            selector,
                            module: owner,
                        });
                    }
                    table.set(selector, cut.module).await?;
                }
            }
            CutAction::Remove => {
                if !cut.module.is_null() {
                    return Err(RegistryError::RemoveModuleMustBeNull(cut.module));
                }
                for &selector in &cut.selectors {
                    if table.unset(selector).await?.is_none() {
                        return Err(RegistryError::SelectorNotFound(selector));
                    }
                }
            }
        }
        Ok(())
    }
}
