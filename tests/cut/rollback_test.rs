//! All-or-nothing semantics across multi-entry batches.

use manifold::cut::{CutAction, FacetCut};
use manifold::selector::ModuleRef;

use crate::support::{assert_consistent, memory_entity, module, owner, sel};

#[tokio::test]
async fn failed_batch_discards_every_earlier_entry() {
    let entity = memory_entity().await;
    entity
        .cut(
            owner(),
            &[FacetCut::new(module(1), CutAction::Add, vec![sel(1)])],
            None,
        )
        .await
        .expect("seed cut should commit");
    let before = entity.loupe().facets().await.expect("facets query");

    // Three valid entries followed by an invalid remove.
    let err = entity
        .cut(
            owner(),
            &[
                FacetCut::new(module(2), CutAction::Add, vec![sel(2), sel(3)]),
                FacetCut::new(module(3), CutAction::Add, vec![sel(4)]),
                FacetCut::new(module(3), CutAction::Replace, vec![sel(1)]),
                FacetCut::new(ModuleRef::NULL, CutAction::Remove, vec![sel(9)]),
            ],
            None,
        )
        .await
        .expect_err("batch with an invalid entry must fail");
    drop(err);

    let after = entity.loupe().facets().await.expect("facets query");
    assert_eq!(before, after, "failed batch must leave state untouched");
    assert_consistent(&entity).await;
}

#[tokio::test]
async fn invariants_hold_after_a_sequence_of_committed_cuts() {
    let entity = memory_entity().await;
    let a = module(1);
    let b = module(2);
    let c = module(3);

    entity
        .cut(
            owner(),
            &[
                FacetCut::new(a, CutAction::Add, vec![sel(1), sel(2)]),
                FacetCut::new(b, CutAction::Add, vec![sel(3), sel(4)]),
            ],
            None,
        )
        .await
        .expect("cut 1 should commit");
    assert_consistent(&entity).await;

    entity
        .cut(
            owner(),
            &[FacetCut::new(c, CutAction::Replace, vec![sel(2), sel(3)])],
            None,
        )
        .await
        .expect("cut 2 should commit");
    assert_consistent(&entity).await;

    entity
        .cut(
            owner(),
            &[FacetCut::new(
                ModuleRef::NULL,
                CutAction::Remove,
                vec![sel(1), sel(4)],
            )],
            None,
        )
        .await
        .expect("cut 3 should commit");
    assert_consistent(&entity).await;

    // a and b lost their last selectors above; only c remains live.
    let live = entity
        .loupe()
        .facet_addresses()
        .await
        .expect("addresses query");
    assert_eq!(live, vec![c]);
}

#[tokio::test]
async fn emptied_module_leaves_live_list_and_readd_appends_at_end() {
    let entity = memory_entity().await;
    let a = module(1);
    let b = module(2);
    entity
        .cut(
            owner(),
            &[
                FacetCut::new(a, CutAction::Add, vec![sel(1)]),
                FacetCut::new(b, CutAction::Add, vec![sel(2)]),
            ],
            None,
        )
        .await
        .expect("seed cut should commit");
    assert_eq!(
        entity
            .loupe()
            .facet_addresses()
            .await
            .expect("addresses query"),
        vec![a, b]
    );

    entity
        .cut(
            owner(),
            &[FacetCut::new(ModuleRef::NULL, CutAction::Remove, vec![sel(1)])],
            None,
        )
        .await
        .expect("remove cut should commit");
    assert_eq!(
        entity
            .loupe()
            .facet_addresses()
            .await
            .expect("addresses query"),
        vec![b]
    );

    // Re-adding appends at the end; the old position is not resurrected.
    entity
        .cut(
            owner(),
            &[FacetCut::new(a, CutAction::Add, vec![sel(3)])],
            None,
        )
        .await
        .expect("re-add cut should commit");
    assert_eq!(
        entity
            .loupe()
            .facet_addresses()
            .await
            .expect("addresses query"),
        vec![b, a]
    );
}
