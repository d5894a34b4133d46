//! The persistent dispatch mapping: selector → owning module.
//!
//! Defines the record key schema and the maintenance steps that keep three
//! views consistent after every logical step:
//!
//! - forward map: one `selector/{hex}` record per routed selector
//! - reverse sets: one `facet/{hex}` record per live module, the exact
//!   reverse image of the forward map
//! - live list: the `facets` record, distinct modules with non-empty sets in
//!   the order they first gained a selector
//!
//! All access goes through a [`Transaction`], so a cut sees its own staged
//! mutations while validating later entries, and nothing leaks on failure.

use crate::error::StoreError;
use crate::selector::{ModuleRef, Selector, SelectorSet};
use crate::store::Transaction;

/// Key of the live-module list record.
const FACETS_KEY: &str = "facets";

/// Key of the forward-mapping record for one selector.
fn selector_key(selector: Selector) -> String {
    format!("selector/{}", selector.bare_hex())
}

/// Key of the reverse selector-set record for one module.
fn facet_key(module: ModuleRef) -> String {
    format!("facet/{}", module.bare_hex())
}

/// View of the dispatch mapping inside one transaction.
pub struct DispatchTable<'a> {
    tx: &'a Transaction,
}

impl<'a> DispatchTable<'a> {
    /// Open the mapping over `tx`.
    pub fn new(tx: &'a Transaction) -> Self {
        Self { tx }
    }

    /// Module currently owning `selector`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on store failure or a corrupt record.
    pub async fn resolve(&self, selector: Selector) -> Result<Option<ModuleRef>, StoreError> {
        let key = selector_key(selector);
        match self.tx.get(&key).await? {
            Some(bytes) => {
                let module =
                    ModuleRef::from_slice(&bytes).map_err(|_| StoreError::Corrupt { key })?;
                Ok(Some(module))
            }
            None => Ok(None),
        }
    }

    /// Selectors currently routed to `module`; empty if the module is not
    /// live. Always the exact reverse image of the forward map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on store failure or a corrupt record.
    pub async fn selectors_of(&self, module: ModuleRef) -> Result<SelectorSet, StoreError> {
        match self.tx.get(&facet_key(module)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(SelectorSet::new()),
        }
    }

    /// Distinct modules owning at least one selector, in the order each one
    /// first gained a selector. A module removed and later re-added appends
    /// at the end; it does not resurrect its old position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on store failure or a corrupt record.
    pub async fn live_modules(&self) -> Result<Vec<ModuleRef>, StoreError> {
        match self.tx.get(FACETS_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Route `selector` to `module` as one logical step: detach it from any
    /// current owner, write the forward entry, grow the new owner's set, and
    /// append the owner to the live list when this is its first selector.
    pub(crate) async fn set(
        &self,
        selector: Selector,
        module: ModuleRef,
    ) -> Result<(), StoreError> {
        if let Some(previous) = self.resolve(selector).await? {
            self.detach(selector, previous).await?;
        }
        self.tx
            .put(selector_key(selector), module.as_bytes().to_vec())?;

        let mut set = self.selectors_of(module).await?;
        if set.is_empty() {
            self.push_live(module).await?;
        }
        set.insert(selector);
        self.tx.put(facet_key(module), serde_json::to_vec(&set)?)?;
        Ok(())
    }

    /// Unroute `selector`, shrinking its owner's set and dropping the owner
    /// from the live list if the set empties. Returns the former owner, or
    /// `None` if the selector was not routed.
    pub(crate) async fn unset(
        &self,
        selector: Selector,
    ) -> Result<Option<ModuleRef>, StoreError> {
        let Some(owner) = self.resolve(selector).await? else {
            return Ok(None);
        };
        self.tx.delete(selector_key(selector))?;
        self.detach(selector, owner).await?;
        Ok(Some(owner))
    }

    /// Remove `selector` from `owner`'s reverse set, deleting the set record
    /// and live-list entry when it empties.
    async fn detach(&self, selector: Selector, owner: ModuleRef) -> Result<(), StoreError> {
        let mut set = self.selectors_of(owner).await?;
        set.remove(selector);
        if set.is_empty() {
            self.tx.delete(facet_key(owner))?;
            self.drop_live(owner).await?;
        } else {
            self.tx.put(facet_key(owner), serde_json::to_vec(&set)?)?;
        }
        Ok(())
    }

    async fn push_live(&self, module: ModuleRef) -> Result<(), StoreError> {
        let mut live = self.live_modules().await?;
        if !live.contains(&module) {
            live.push(module);
            self.tx.put(FACETS_KEY, serde_json::to_vec(&live)?)?;
        }
        Ok(())
    }

    async fn drop_live(&self, module: ModuleRef) -> Result<(), StoreError> {
        let mut live = self.live_modules().await?;
        live.retain(|m| *m != module);
        self.tx.put(FACETS_KEY, serde_json::to_vec(&live)?)?;
        Ok(())
    }
}
