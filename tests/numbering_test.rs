mod common;

use common::{TestHarness, OTHER_TEAM, TEAM};
use stockflow::{
    db::{with_unit_of_work, UnitOfWork}, repositories::catalog_repository::NewGoods,
    services::numbering::NumberScope,
};

async fn allocate(harness: &TestHarness, team_id: i32, scope: NumberScope) -> String {
    let numbering = harness.factory.numbering_service();
    with_unit_of_work(&harness.db, None, |uow| {
        Box::pin(async move { numbering.next_number(uow.conn(), team_id, scope).await })
    })
    .await
    .expect("number allocated")
}

#[tokio::test]
async fn empty_scope_starts_at_seed_and_counts_up() {
    let harness = TestHarness::new().await;

    assert_eq!(allocate(&harness, TEAM, NumberScope::StockTransfer).await, "ST000000000001");
    assert_eq!(allocate(&harness, TEAM, NumberScope::StockTransfer).await, "ST000000000002");
    assert_eq!(allocate(&harness, TEAM, NumberScope::StockOut).await, "SO000000000001");
    assert_eq!(allocate(&harness, OTHER_TEAM, NumberScope::StockTransfer).await, "ST000000000001");
}

#[tokio::test]
async fn rolled_back_allocation_is_reissued() {
    let harness = TestHarness::new().await;
    let numbering = harness.factory.numbering_service();

    let uow = UnitOfWork::begin(&harness.db, None).await.expect("begin");
    let taken = numbering
        .next_number(uow.conn(), TEAM, NumberScope::StockIn)
        .await
        .expect("allocated");
    uow.rollback().await.expect("rollback");

    assert_eq!(allocate(&harness, TEAM, NumberScope::StockIn).await, taken);
}

#[tokio::test]
async fn sequence_bootstraps_from_the_latest_document() {
    let harness = TestHarness::new().await;
    let numbering = harness.factory.numbering_service();

    // The seeded goods "G-Y" carries no counter, so numbering starts over.
    assert_eq!(
        numbering
            .preview_number(TEAM, NumberScope::Goods)
            .await
            .expect("preview"),
        "G000000000001"
    );

    harness
        .factory
        .catalog_repository()
        .create_goods(
            harness.db.as_ref(),
            TEAM,
            NewGoods {
                number: "G000000000007".into(),
                name: "Imported".into(),
                ..Default::default()
            },
        )
        .await
        .expect("goods created");
    let listed = harness
        .factory
        .catalog_repository()
        .list_goods(TEAM)
        .await
        .expect("goods listable");
    assert_eq!(listed.len(), 3);

    assert_eq!(allocate(&harness, TEAM, NumberScope::Goods).await, "G000000000008");
    assert_eq!(allocate(&harness, TEAM, NumberScope::Goods).await, "G000000000009");
}

#[tokio::test]
async fn preview_matches_the_next_allocation() {
    let harness = TestHarness::new().await;
    let numbering = harness.factory.numbering_service();

    allocate(&harness, TEAM, NumberScope::StockTransfer).await;
    let preview = numbering
        .preview_number(TEAM, NumberScope::StockTransfer)
        .await
        .expect("preview");
    assert_eq!(preview, "ST000000000002");
    assert_eq!(allocate(&harness, TEAM, NumberScope::StockTransfer).await, preview);
}
