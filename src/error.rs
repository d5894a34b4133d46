//! Failure taxonomy for the registry.
//!
//! Every failure aborts the enclosing invocation immediately. Nothing is
//! retried, and because mutations are staged in an uncommitted
//! [`Transaction`](crate::store::Transaction), a failed invocation leaves
//! registry state exactly as it was before the invocation began.

use thiserror::Error;

use crate::selector::{ModuleRef, Selector};

/// Errors from the persistent state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite backend failed.
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// A persisted JSON record could not be encoded or decoded.
    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A persisted record had an unexpected shape.
    #[error("corrupt record under key {key}")]
    Corrupt {
        /// The record's store key.
        key: String,
    },

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors from cuts, dispatch, and ownership operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The caller is not the registry owner.
    #[error("caller {caller} is not the owner")]
    Unauthorized {
        /// The rejected caller identity.
        caller: ModuleRef,
    },

    /// A cut entry supplied zero selectors.
    #[error("cut entry for module {module} has no selectors")]
    EmptySelectorList {
        /// The entry's target module.
        module: ModuleRef,
    },

    /// An Add or Replace entry named the null module reference.
    #[error("cannot route selectors to the null module reference")]
    AddToNullModule,

    /// A Remove entry named a non-null module reference.
    #[error("remove entries must use the null module reference, got {0}")]
    RemoveModuleMustBeNull(ModuleRef),

    /// An Add targeted a selector that already has an owner.
    #[error("selector {selector} is already owned by module {owner}")]
    SelectorAlreadyExists {
        /// The colliding selector.
        selector: Selector,
        /// Its current owner.
        owner: ModuleRef,
    },

    /// A Replace or Remove targeted a selector with no owner.
    #[error("selector {0} is not mapped to any module")]
    SelectorNotFound(Selector),

    /// A Replace named the module that already owns the selector.
    #[error("selector {selector} is already owned by replacement module {module}")]
    ReplaceWithSameModule {
        /// The selector being replaced.
        selector: Selector,
        /// The module that both owns it and was named as replacement.
        module: ModuleRef,
    },

    /// The post-cut initialization call failed; the whole cut was discarded.
    #[error("initialization call to {target} failed: {reason}")]
    InitializationFailed {
        /// The init target module.
        target: ModuleRef,
        /// The failure raised by the module's init code.
        reason: anyhow::Error,
    },

    /// Dispatch targeted a selector with no owning module.
    #[error("no facet owns selector {0}")]
    FunctionNotFound(Selector),

    /// A referenced module has no facet code bound in this process.
    #[error("module {0} has no bound facet code")]
    ModuleNotBound(ModuleRef),

    /// The persistent store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Delegated facet code failed; the error propagates unchanged.
    #[error(transparent)]
    Facet(#[from] anyhow::Error),
}
