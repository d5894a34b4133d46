//! Per-entry validation rules for cut batches.

use manifold::cut::{CutAction, FacetCut};
use manifold::error::RegistryError;
use manifold::selector::{ModuleRef, SelectorSet};

use crate::support::{assert_consistent, memory_entity, module, owner, sel};

#[tokio::test]
async fn add_then_query_round_trip() {
    let entity = memory_entity().await;
    let m = module(1);
    let selectors = vec![sel(1), sel(2), sel(3)];

    entity
        .cut(
            owner(),
            &[FacetCut::new(m, CutAction::Add, selectors.clone())],
            None,
        )
        .await
        .expect("add cut should commit");

    let owned = entity
        .loupe()
        .facet_function_selectors(m)
        .await
        .expect("selector query");
    let expected: SelectorSet = selectors.iter().copied().collect();
    assert_eq!(owned, expected);

    for &selector in &selectors {
        let resolved = entity
            .loupe()
            .facet_address(selector)
            .await
            .expect("address query");
        assert_eq!(resolved, Some(m));
    }
    assert_consistent(&entity).await;
}

#[tokio::test]
async fn empty_selector_list_is_rejected() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, Vec::new())],
            None,
        )
        .await
        .expect_err("empty selector list must fail");
    assert!(matches!(err, RegistryError::EmptySelectorList { .. }));
}

#[tokio::test]
async fn add_to_null_module_is_rejected() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(ModuleRef::NULL, CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect_err("add to null module must fail");
    assert!(matches!(err, RegistryError::AddToNullModule));
}

#[tokio::test]
async fn add_of_owned_selector_is_rejected() {
    let entity = memory_entity().await;
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect("seed cut should commit");

    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(module(2), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect_err("second add of the same selector must fail");
    assert!(matches!(
        err,
        RegistryError::SelectorAlreadyExists { owner: o, .. } if o == module(1)
    ));
}

#[tokio::test]
async fn add_collides_within_its_own_batch() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[
                FacetCut::new(module(1), CutAction::Add, vec![sel(1), sel(2)]),
                FacetCut::new(module(2), CutAction::Add, vec![sel(2)]),
            ],
            None,
        )
        .await
        .expect_err("collision inside one batch must fail");
    assert!(matches!(err, RegistryError::SelectorAlreadyExists { .. }));

    // The whole batch was discarded, including the valid first entry.
    let facets = entity.loupe().facets().await.expect("facets query");
    assert!(facets.is_empty(), "no entry of the failed batch may survive");
}

#[tokio::test]
async fn add_collides_with_its_own_module_in_one_entry() {
    let entity = memory_entity().await;
    let m = module(1);
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(m, CutAction::Add, vec![sel(1), sel(1)])],
            None,
        )
        .await
        .expect_err("duplicate selector in one entry must fail");
    assert!(matches!(
        err,
        RegistryError::SelectorAlreadyExists { owner: o, .. } if o == m
    ));
    assert!(entity
        .loupe()
        .facets()
        .await
        .expect("facets query")
        .is_empty());
}

#[tokio::test]
async fn replace_moves_owner_and_preserves_totals() {
    let entity = memory_entity().await;
    let a = module(1);
    let b = module(2);
    entity
        .cut(
            owner(),
            &[
                FacetCut::new(a, CutAction::Add, vec![sel(1), sel(2)]),
                FacetCut::new(b, CutAction::Add, vec![sel(3)]),
            ],
            None,
        )
        .await
        .expect("seed cut should commit");

    entity
        .cut(
            owner(),
            &[FacetCut::new(b, CutAction::Replace, vec![sel(1)])],
            None,
        )
        .await
        .expect("replace cut should commit");

    let a_set = entity
        .loupe()
        .facet_function_selectors(a)
        .await
        .expect("selector query");
    let b_set = entity
        .loupe()
        .facet_function_selectors(b)
        .await
        .expect("selector query");
    assert_eq!(a_set.as_slice(), &[sel(2)]);
    assert!(b_set.contains(sel(3)) && b_set.contains(sel(1)));
    assert_eq!(a_set.len().saturating_add(b_set.len()), 3);
    assert_eq!(
        entity
            .loupe()
            .facet_address(sel(1))
            .await
            .expect("address query"),
        Some(b)
    );
    assert_consistent(&entity).await;
}

#[tokio::test]
async fn replace_of_unrouted_selector_is_rejected() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Replace, vec![sel(9)])],
            None,
        )
        .await
        .expect_err("replace of unrouted selector must fail");
    assert!(matches!(err, RegistryError::SelectorNotFound(s) if s == sel(9)));
}

#[tokio::test]
async fn replace_with_current_owner_is_rejected() {
    let entity = memory_entity().await;
    let m = module(1);
    entity
        .cut(owner(), &[FacetCut::new(m, CutAction::Add, vec![sel(1)])], None)
        .await
        .expect("seed cut should commit");

    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(m, CutAction::Replace, vec![sel(1)])],
            None,
        )
        .await
        .expect_err("replace with the same module must fail");
    assert!(matches!(err, RegistryError::ReplaceWithSameModule { .. }));
}

#[tokio::test]
async fn replace_to_null_module_is_rejected() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(
                ModuleRef::NULL,
                CutAction::Replace,
                vec![sel(1)],
            )],
            None,
        )
        .await
        .expect_err("replace to null module must fail");
    assert!(matches!(err, RegistryError::AddToNullModule));
}

#[tokio::test]
async fn remove_requires_null_module() {
    let entity = memory_entity().await;
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect("seed cut should commit");

    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Remove, vec![sel(1)])],
            None,
        )
        .await
        .expect_err("remove with a non-null module must fail");
    assert!(matches!(err, RegistryError::RemoveModuleMustBeNull(m) if m == module(1)));
}

#[tokio::test]
async fn remove_of_unrouted_selector_is_rejected() {
    let entity = memory_entity().await;
    let err = entity
        .cut(
            owner(),
            &[FacetCut::new(
                ModuleRef::NULL,
                CutAction::Remove,
                vec![sel(7)],
            )],
            None,
        )
        .await
        .expect_err("remove of unrouted selector must fail");
    assert!(matches!(err, RegistryError::SelectorNotFound(s) if s == sel(7)));
}

#[tokio::test]
async fn remove_then_readd_resolves_to_new_module() {
    let entity = memory_entity().await;
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect("seed cut should commit");
    entity
        .cut(
            owner(),
            &[FacetCut::new(
                ModuleRef::NULL,
                CutAction::Remove,
                vec![sel(1)],
            )],
            None,
        )
        .await
        .expect("remove cut should commit");
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(2), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect("re-add cut should commit");

    assert_eq!(
        entity
            .loupe()
            .facet_address(sel(1))
            .await
            .expect("address query"),
        Some(module(2))
    );
    assert_consistent(&entity).await;
}

#[tokio::test]
async fn later_entries_observe_earlier_entries_in_the_same_batch() {
    let entity = memory_entity().await;
    let a = module(1);
    let b = module(2);

    // Add then replace the same selector inside one batch.
    entity
        .cut(
            owner(),
            &[
                FacetCut::new(a, CutAction::Add, vec![sel(1)]),
                FacetCut::new(b, CutAction::Replace, vec![sel(1)]),
            ],
            None,
        )
        .await
        .expect("add+replace batch should commit");
    assert_eq!(
        entity
            .loupe()
            .facet_address(sel(1))
            .await
            .expect("address query"),
        Some(b)
    );

    // Remove then re-add inside one batch.
    entity
        .cut(
            owner(),
            &[
                FacetCut::new(ModuleRef::NULL, CutAction::Remove, vec![sel(1)]),
                FacetCut::new(a, CutAction::Add, vec![sel(1)]),
            ],
            None,
        )
        .await
        .expect("remove+add batch should commit");
    assert_eq!(
        entity
            .loupe()
            .facet_address(sel(1))
            .await
            .expect("address query"),
        Some(a)
    );
    assert_consistent(&entity).await;
}
