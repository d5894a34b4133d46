//! Single-authority gate over mutating operations.
//!
//! The owner is one `ModuleRef`-shaped identity stored in the same
//! transactional store as the mapping. It is seeded at entity
//! initialization and changed only by an explicit transfer checked against
//! the current owner. Introspection and dispatch are not gated.

use std::sync::Arc;

use tracing::info;

use crate::error::{RegistryError, StoreError};
use crate::selector::ModuleRef;
use crate::store::{StateStore, WriteOp};

/// Key of the owner record.
const OWNER_KEY: &str = "owner";

/// Reads and enforces the owner identity.
pub struct OwnershipGuard {
    store: Arc<dyn StateStore>,
}

impl OwnershipGuard {
    /// Attach the guard to `store`.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Current owner, or `None` if the registry was never initialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on store failure or a corrupt record.
    pub async fn owner(&self) -> Result<Option<ModuleRef>, StoreError> {
        match self.store.get(OWNER_KEY).await? {
            Some(bytes) => {
                let owner = ModuleRef::from_slice(&bytes).map_err(|_| StoreError::Corrupt {
                    key: OWNER_KEY.to_owned(),
                })?;
                Ok(Some(owner))
            }
            None => Ok(None),
        }
    }

    /// Reject `caller` unless it is the current owner.
    ///
    /// Checked before any mutation is staged, so an unauthorized invocation
    /// has zero observable effect.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unauthorized`] for any non-owner caller.
    pub async fn ensure_owner(&self, caller: ModuleRef) -> Result<(), RegistryError> {
        match self.owner().await? {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(RegistryError::Unauthorized { caller }),
        }
    }

    /// Write the initial owner record.
    pub(crate) async fn seed(&self, owner: ModuleRef) -> Result<(), StoreError> {
        self.store
            .apply(vec![WriteOp::Put {
                key: OWNER_KEY.to_owned(),
                value: owner.as_bytes().to_vec(),
            }])
            .await
    }

    /// Transfer ownership to `new_owner`, gated on the current owner.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unauthorized`] if `caller` is not the
    /// current owner, or a store error.
    pub async fn transfer(
        &self,
        caller: ModuleRef,
        new_owner: ModuleRef,
    ) -> Result<(), RegistryError> {
        self.ensure_owner(caller).await?;
        self.seed(new_owner).await?;
        info!(previous = %caller, owner = %new_owner, "ownership transferred");
        Ok(())
    }
}
