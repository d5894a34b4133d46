//! The optional post-cut initialization hook.

use std::sync::Arc;

use manifold::cut::{CutAction, FacetCut};
use manifold::error::RegistryError;
use manifold::selector::ModuleRef;

use crate::support::{memory_entity, module, owner, sel, FailingFacet, InitRecorder};

#[tokio::test]
async fn init_hook_writes_land_with_the_cut() {
    let entity = memory_entity().await;
    let m = module(1);
    entity.binder().bind(m, Arc::new(InitRecorder));

    entity
        .cut(
            owner(),
            &[FacetCut::new(m, CutAction::Add, vec![sel(1)])],
            Some((m, b"seed-payload")),
        )
        .await
        .expect("cut with init should commit");

    // InitRecorder::execute returns the record its init hook wrote.
    let readback = entity
        .dispatch(owner(), sel(1), &[])
        .await
        .expect("dispatch should succeed");
    assert_eq!(readback, b"seed-payload".to_vec());
}

#[tokio::test]
async fn failing_init_rolls_back_the_whole_cut() {
    let entity = memory_entity().await;
    let m = module(1);
    entity.binder().bind(m, Arc::new(FailingFacet));

    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(m, CutAction::Add, vec![sel(1)])],
            Some((m, b"ignored")),
        )
        .await
        .expect_err("failing init must fail the cut");
    assert!(matches!(err, RegistryError::InitializationFailed { .. }));

    // All mapping mutations from the cut were discarded too.
    let facets = entity.loupe().facets().await.expect("facets query");
    assert!(facets.is_empty(), "rolled-back cut must leave no facets");
    let err = entity
        .dispatch(owner(), sel(1), &[])
        .await
        .expect_err("selector from rolled-back cut must not route");
    assert!(matches!(err, RegistryError::FunctionNotFound(_)));
}

#[tokio::test]
async fn unbound_init_target_fails_the_cut() {
    let entity = memory_entity().await;
    let target = module(9);

    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            Some((target, b"payload")),
        )
        .await
        .expect_err("unbound init target must fail");
    assert!(matches!(err, RegistryError::ModuleNotBound(m) if m == target));

    let facets = entity.loupe().facets().await.expect("facets query");
    assert!(facets.is_empty());
}

#[tokio::test]
async fn null_init_target_skips_the_hook() {
    let entity = memory_entity().await;
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            Some((ModuleRef::NULL, b"ignored")),
        )
        .await
        .expect("null init target must not be an error");
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(2), CutAction::Add, vec![sel(2)])],
            None,
        )
        .await
        .expect("absent init must not be an error");
}
