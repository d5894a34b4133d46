//! The single logical entity: one stable identity, a composed facet surface.
//!
//! `Entity` ties the injected store, the process-local code binder, and the
//! owner record together behind the surface the embedding application talks
//! to. All durable state lives in the store: two `Entity` values over the
//! same store observe the same registry.

use std::sync::Arc;

use crate::cut::{CutProcessor, FacetCut};
use crate::dispatch::Dispatcher;
use crate::error::{RegistryError, StoreError};
use crate::facet::FacetBinder;
use crate::loupe::Loupe;
use crate::ownership::OwnershipGuard;
use crate::selector::{ModuleRef, Selector};
use crate::store::StateStore;

/// A composed, upgradeable entity.
pub struct Entity {
    binder: Arc<FacetBinder>,
    cut: CutProcessor,
    dispatcher: Dispatcher,
    loupe: Loupe,
    guard: OwnershipGuard,
}

impl Entity {
    /// Create a fresh entity over `store`, seeding `initial_owner` as the
    /// cut authority.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the owner record cannot be
    /// written.
    pub async fn new(
        store: Arc<dyn StateStore>,
        binder: Arc<FacetBinder>,
        initial_owner: ModuleRef,
    ) -> Result<Self, RegistryError> {
        let entity = Self::open(store, binder);
        entity.guard.seed(initial_owner).await?;
        Ok(entity)
    }

    /// Attach to registry state already persisted in `store`.
    pub fn open(store: Arc<dyn StateStore>, binder: Arc<FacetBinder>) -> Self {
        Self {
            binder: Arc::clone(&binder),
            cut: CutProcessor::new(Arc::clone(&store), Arc::clone(&binder)),
            dispatcher: Dispatcher::new(Arc::clone(&store), binder),
            loupe: Loupe::new(Arc::clone(&store)),
            guard: OwnershipGuard::new(store),
        }
    }

    /// Submit a cut batch with an optional `(target, payload)` init call.
    ///
    /// # Errors
    ///
    /// See [`CutProcessor::apply_cut`].
    pub async fn cut(
        &self,
        caller: ModuleRef,
        cuts: &[FacetCut],
        init: Option<(ModuleRef, &[u8])>,
    ) -> Result<(), RegistryError> {
        self.cut.apply_cut(caller, cuts, init).await
    }

    /// Route one incoming call by selector.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub async fn dispatch(
        &self,
        caller: ModuleRef,
        selector: Selector,
        args: &[u8],
    ) -> Result<Vec<u8>, RegistryError> {
        self.dispatcher.dispatch(caller, selector, args).await
    }

    /// The introspection surface.
    pub fn loupe(&self) -> &Loupe {
        &self.loupe
    }

    /// The process-local code binder, for deploying facet implementations.
    pub fn binder(&self) -> &FacetBinder {
        &self.binder
    }

    /// Current owner identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on store failure.
    pub async fn owner(&self) -> Result<Option<ModuleRef>, StoreError> {
        self.guard.owner().await
    }

    /// Transfer cut authority to `new_owner`, gated on the current owner.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unauthorized`] for a non-owner caller.
    pub async fn transfer_ownership(
        &self,
        caller: ModuleRef,
        new_owner: ModuleRef,
    ) -> Result<(), RegistryError> {
        self.guard.transfer(caller, new_owner).await
    }
}
