// ==========================================
// 装载场景集成测试
// ==========================================
// 覆盖: 容量边界 / 分组上限 / 两托盘分配 / 未装载商品
// ==========================================

mod helpers;

use helpers::{dec, init_logging, ContextBuilder, ProductBuilder};
use pallet_mounting::config::{config_keys, PalletizeSettings};
use pallet_mounting::domain::space::SpaceKey;
use pallet_mounting::domain::types::{MapKind, SpaceSide};
use pallet_mounting::engine::rules::NO_CAPACITY;
use pallet_mounting::engine::{
    validate_invariants, DomainOperations, PalletizeError, Palletizer, PlacementOptions, PlacementTarget,
};
use rust_decimal::Decimal;

fn driver(number: u32) -> SpaceKey {
    SpaceKey::new(number, SpaceSide::Driver)
}

#[test]
fn test_two_items_on_two_spaces() {
    // ==========================================
    // 场景: 尺寸 10 的两个车位, 商品 10 + 5
    // 期望: 两个托盘, 占用 10 与 5
    // ==========================================
    init_logging();
    let mut builder = ContextBuilder::new(MapKind::Common).spaces(&[10, 10]);
    let order = builder.order(1, "M1", "C1");
    builder.item(order, ProductBuilder::new(1).build(), 10);
    builder.item(order, ProductBuilder::new(2).build(), 5);
    let mut ctx = builder.build();

    let summary = Palletizer::new().run(&mut ctx).unwrap();

    assert!(summary.is_fully_palletized());
    assert_eq!(summary.pallet_count(), 2);
    let mut occupations: Vec<Decimal> = summary.pallets.iter().map(|p| p.occupation).collect();
    occupations.sort();
    assert_eq!(occupations, vec![dec(5), dec(10)]);
    assert_eq!(summary.total_occupation, dec(15));
    validate_invariants(&ctx).unwrap();
}

#[test]
fn test_can_add_exact_capacity() {
    let mut builder = ContextBuilder::new(MapKind::Common).spaces(&[10]);
    let order = builder.order(1, "M1", "C1");
    let item = builder.item(order, ProductBuilder::new(1).build(), 20);
    let ctx = builder.build();
    let ops = DomainOperations::new();

    let target = PlacementTarget::Space(driver(1));
    assert!(ops.can_add(&ctx, target, item, 10).unwrap());
    assert!(!ops.can_add(&ctx, target, item, 11).unwrap());
}

#[test]
fn test_can_add_rejects_group_over_limit() {
    let settings = PalletizeSettings::new()
        .with(config_keys::SHOULD_LIMIT_PACKAGE_GROUPS, true)
        .with(config_keys::MAX_PACKAGE_GROUPS, 1u32);
    let mut builder = ContextBuilder::with_settings(MapKind::Common, settings).spaces(&[10]);
    let order = builder.order(1, "M1", "C1");
    let beer = builder.item(order, ProductBuilder::new(1).group(1, 1).build(), 3);
    let water = builder.item(order, ProductBuilder::new(2).group(2, 1).build(), 3);
    let same_group = builder.item(order, ProductBuilder::new(3).group(1, 2).build(), 3);
    let mut ctx = builder.build();

    ctx.add_product(driver(1), beer, 3, PlacementOptions::default())
        .unwrap();
    let ms = ctx.mounted_space_by_key(driver(1)).unwrap().id;
    let ops = DomainOperations::new();

    assert!(!ops.can_add_to_mounted_space(&ctx, ms, water, 1).unwrap());
    assert!(ops.can_add_to_mounted_space(&ctx, ms, same_group, 1).unwrap());
}

#[test]
fn test_overflow_is_reported_not_palletized() {
    let mut builder = ContextBuilder::new(MapKind::Common).spaces(&[10]);
    let order = builder.order(1, "M1", "C1");
    builder.item(order, ProductBuilder::new(1).build(), 14);
    let mut ctx = builder.build();

    let summary = Palletizer::new().run(&mut ctx).unwrap();

    assert_eq!(summary.pallet_count(), 1);
    assert_eq!(summary.not_palletized.total_amount, 4);
    assert_eq!(summary.not_palletized.items[0].reason.as_deref(), Some(NO_CAPACITY));
}

#[test]
fn test_missing_factor_aborts_run() {
    let mut builder = ContextBuilder::new(MapKind::Common).spaces(&[10]);
    let order = builder.order(1, "M1", "C1");
    builder.item(order, ProductBuilder::new(9).without_factors().build(), 1);
    let mut ctx = builder.build();

    let err = Palletizer::new().run(&mut ctx).unwrap_err();
    assert!(matches!(err, PalletizeError::MissingFactor { product_code: 9, .. }));
    assert!(ctx.all_mounted_spaces().is_empty());
}

#[test]
fn test_smaller_space_uses_own_factor() {
    // 尺寸 8 上系数 1.25: 8 个占满
    let mut builder = ContextBuilder::new(MapKind::Common).spaces(&[8]);
    let order = builder.order(1, "M1", "C1");
    let item = builder.item(order, ProductBuilder::new(1).build(), 6);
    let ctx = builder.build();
    let ops = DomainOperations::new();

    let target = PlacementTarget::Space(driver(1));
    assert_eq!(ops.quantity_fitting(&ctx, target, item).unwrap(), 6);
    assert_eq!(
        ops.occupation_to_add(&ctx, dec(8), item, 4).unwrap(),
        dec(5)
    );
}
