//! Manifold — an upgradeable dispatch registry.
//!
//! One stable entity identity, many independently maintained code modules
//! ("facets"). Each incoming call is routed by a 4-byte selector to
//! whichever facet currently owns it; facets are added, replaced, and
//! removed at runtime through owner-authorized atomic batches ("cuts").
//! All registry state lives in an injected transactional store, never in
//! process memory.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod selector;
pub mod store;

pub mod facet;
pub mod ownership;
pub mod table;

pub mod cut;
pub mod dispatch;
pub mod entity;
pub mod loupe;
