mod common;

use assert_matches::assert_matches;
use common::{dec, TestHarness, OTHER_TEAM, TEAM};
use stockflow::{errors::ServiceError, repositories::catalog_repository::NewGoods};

#[tokio::test]
async fn goods_with_a_band_warn_outside_it() {
    let harness = TestHarness::new().await;
    let catalog = harness.factory.catalog_repository();

    let goods = catalog
        .create_goods(
            harness.db.as_ref(),
            TEAM,
            NewGoods {
                number: "G-BAND".into(),
                name: "Banded".into(),
                inventory_lower: Some(dec(10)),
                inventory_upper: Some(dec(100)),
                ..Default::default()
            },
        )
        .await
        .expect("goods created");

    assert!(goods.enable_inventory_warning);
    assert!(goods.is_outside_warning_band(dec(5)));
    assert!(!goods.is_outside_warning_band(dec(10)));
    assert!(!goods.is_outside_warning_band(dec(100)));
    assert!(goods.is_outside_warning_band(dec(101)));

    let plain = catalog
        .find_goods(harness.db.as_ref(), TEAM, harness.goods_x)
        .await
        .expect("seeded goods");
    assert!(!plain.is_outside_warning_band(dec(-50)));
}

#[tokio::test]
async fn inverted_band_and_blank_name_are_rejected() {
    let harness = TestHarness::new().await;
    let catalog = harness.factory.catalog_repository();

    assert_matches!(
        catalog
            .create_goods(
                harness.db.as_ref(),
                TEAM,
                NewGoods {
                    number: "G-BAD".into(),
                    name: "Inverted".into(),
                    inventory_lower: Some(dec(50)),
                    inventory_upper: Some(dec(10)),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );

    assert_matches!(
        catalog
            .create_goods(
                harness.db.as_ref(),
                TEAM,
                NewGoods {
                    number: "G-BLANK".into(),
                    name: "  ".into(),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn duplicate_goods_number_is_a_conflict_within_a_team_only() {
    let harness = TestHarness::new().await;
    let catalog = harness.factory.catalog_repository();
    let duplicate = || NewGoods {
        number: "G-X".into(),
        name: "Widget again".into(),
        ..Default::default()
    };

    assert_matches!(
        catalog
            .create_goods(harness.db.as_ref(), TEAM, duplicate())
            .await,
        Err(ServiceError::Conflict(_))
    );
    catalog
        .create_goods(harness.db.as_ref(), OTHER_TEAM, duplicate())
        .await
        .expect("numbers are unique per team");
}

#[tokio::test]
async fn lookups_are_tenant_scoped() {
    let harness = TestHarness::new().await;
    let catalog = harness.factory.catalog_repository();

    assert_matches!(
        catalog
            .find_warehouse(harness.db.as_ref(), TEAM, harness.foreign_warehouse)
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        catalog
            .find_goods(harness.db.as_ref(), OTHER_TEAM, harness.goods_x)
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        catalog
            .ensure_goods_exist(harness.db.as_ref(), TEAM, &[harness.goods_x, harness.goods_y, 777])
            .await,
        Err(ServiceError::NotFound(message)) if message.contains("777")
    );
    catalog
        .ensure_goods_exist(harness.db.as_ref(), TEAM, &[harness.goods_y, harness.goods_x])
        .await
        .expect("both goods belong to the team");
}
