use super::*;
use crate::config::{config_keys, PalletizeSettings, SettingValue};
use crate::domain::mounted::MountedSpaceId;
use crate::domain::order::OrderId;
use crate::domain::product::{PackingGroup, Product};
use crate::domain::space::{Space, SpaceKey};
use crate::domain::types::{ContainerType, MapKind, SpaceSide};
use crate::engine::context::{PalletizeContext, PlacementOptions, PlacementTarget};
use rust_decimal::Decimal;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

fn key(number: u32) -> SpaceKey {
    SpaceKey {
        number,
        side: SpaceSide::Driver,
    }
}

/// 尺寸 10 上 1 单位 = 1.0, 尺寸 8 上 1 单位 = 1.25
fn product(code: u32, group: u32) -> Product {
    Product::new(code, format!("P{}", code), PackingGroup::new(group, 1))
        .with_factor(dec(10), Decimal::ONE)
        .with_factor(dec(8), Decimal::new(125, 2))
}

fn create_test_context(settings: PalletizeSettings, sizes: &[i64]) -> (PalletizeContext, OrderId) {
    let mut ctx = PalletizeContext::new(MapKind::Common, settings);
    for (index, size) in sizes.iter().enumerate() {
        ctx.add_space(Space::new(index as u32 + 1, SpaceSide::Driver, dec(*size)))
            .unwrap();
    }
    let order = ctx.add_order(1, "M1", "C1");
    (ctx, order)
}

fn place(ctx: &mut PalletizeContext, order: OrderId, p: Product, amount: u32, space: u32) -> MountedSpaceId {
    let item = ctx.add_item(order, Arc::new(p), amount).unwrap();
    ctx.add_product(key(space), item, amount, PlacementOptions::default())
        .unwrap();
    ctx.mounted_space_by_key(key(space)).unwrap().id
}

// ==========================================
// CanAdd
// ==========================================

#[test]
fn test_can_add_allows_exact_capacity() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10]);
    let ops = DomainOperations::new();
    let ms = place(&mut ctx, order, product(1, 1), 4, 1);
    let item = ctx.add_item(order, Arc::new(product(2, 1)), 7).unwrap();

    assert!(ops.can_add_to_mounted_space(&ctx, ms, item, 6).unwrap());
    assert!(!ops.can_add_to_mounted_space(&ctx, ms, item, 7).unwrap());
    assert!(ops.can_add(&ctx, PlacementTarget::Space(key(1)), item, 6).unwrap());
}

#[test]
fn test_can_add_to_unknown_space_is_false() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10]);
    let ops = DomainOperations::new();
    let item = ctx.add_item(order, Arc::new(product(1, 1)), 1).unwrap();
    assert!(!ops.can_add_to_space(&ctx, key(9), item, 1).unwrap());
    assert!(ops.can_add_to_space(&ctx, key(1), item, 1).unwrap());
}

#[test]
fn test_group_limit_rejects_non_associable_group() {
    let settings = PalletizeSettings::new()
        .with(config_keys::SHOULD_LIMIT_PACKAGE_GROUPS, true)
        .with(config_keys::MAX_PACKAGE_GROUPS, 1u32);
    let (mut ctx, order) = create_test_context(settings, &[10]);
    let ops = DomainOperations::new();
    let ms = place(&mut ctx, order, product(1, 100), 2, 1);

    let other = product(2, 200);
    assert!(!ops.can_add_basic(&ctx, ms, &other).unwrap());
    let same_group = product(3, 100);
    assert!(ops.can_add_basic(&ctx, ms, &same_group).unwrap());
}

#[test]
fn test_group_limit_requires_association_with_every_group() {
    let settings = PalletizeSettings::new()
        .with(config_keys::SHOULD_LIMIT_PACKAGE_GROUPS, true)
        .with(config_keys::MAX_PACKAGE_GROUPS, SettingValue::Number(dec(3)));
    let (mut ctx, order) = create_test_context(settings, &[10]);
    let ops = DomainOperations::new();
    let ms = place(&mut ctx, order, product(1, 100), 1, 1);
    let item = ctx.add_item(order, Arc::new(product(2, 200)), 1).unwrap();
    ctx.add_complex_load_product(key(1), item, 1, Decimal::ONE, PlacementOptions::default())
        .unwrap();

    let partial = product(3, 300).with_associable_groups(vec![100]);
    assert!(!ops.can_add_basic(&ctx, ms, &partial).unwrap());
    let full = product(4, 300).with_associable_groups(vec![100, 200]);
    assert!(ops.can_add_basic(&ctx, ms, &full).unwrap());
}

#[test]
fn test_chopp_and_container_separation() {
    let settings = PalletizeSettings::new()
        .with(config_keys::CHOPP_EXCLUSIVE_PALLET, true)
        .with(config_keys::SEPARATE_RETURNABLE_FROM_DISPOSABLE, true);
    let (mut ctx, order) = create_test_context(settings, &[10]);
    let ops = DomainOperations::new();
    let ms = place(&mut ctx, order, product(1, 1), 1, 1);

    let mut chopp = product(2, 1);
    chopp.is_chopp = true;
    assert!(!ops.can_add_basic(&ctx, ms, &chopp).unwrap());

    let mut returnable = product(3, 1);
    returnable.container_type = ContainerType::Returnable;
    assert!(!ops.can_add_basic(&ctx, ms, &returnable).unwrap());
    assert!(ops.can_add_basic(&ctx, ms, &product(4, 2)).unwrap());
}

// ==========================================
// 移动
// ==========================================

#[test]
fn test_move_mounted_product_partial_and_full() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 8]);
    let ops = DomainOperations::new();
    let ms = place(&mut ctx, order, product(1, 1), 4, 1);
    let mp = ctx.products_of(ms).unwrap()[0].id;

    let outcome = ops
        .move_mounted_product(&mut ctx, mp, 2, PlacementTarget::Space(key(2)))
        .unwrap();
    assert!(outcome.is_moved());
    assert_eq!(ctx.mounted_space(ms).unwrap().occupation, dec(2));
    let target = ctx.mounted_space_by_key(key(2)).unwrap();
    assert_eq!(target.occupation, Decimal::new(25, 1));

    ops.move_mounted_product(&mut ctx, mp, 2, PlacementTarget::Space(key(2)))
        .unwrap();
    assert!(ctx.mounted_space_by_key(key(1)).is_none());
    assert_eq!(ctx.mounted_space_by_key(key(2)).unwrap().occupation, dec(5));
}

#[test]
fn test_move_rejected_without_mutation() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 8]);
    let ops = DomainOperations::new();
    let source = place(&mut ctx, order, product(1, 1), 8, 1);
    place(&mut ctx, order, product(2, 1), 4, 2);
    let mp = ctx.products_of(source).unwrap()[0].id;

    let outcome = ops
        .move_mounted_product(&mut ctx, mp, 8, PlacementTarget::Space(key(2)))
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::Capacity));
    assert_eq!(ctx.mounted_space(source).unwrap().occupation, dec(8));

    let outcome = ops
        .move_mounted_product(&mut ctx, mp, 1, PlacementTarget::MountedSpace(source))
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::SameSpace));
}

// ==========================================
// 重平衡
// ==========================================

#[test]
fn test_join_spaces_frees_one_space() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 10]);
    let ops = DomainOperations::new();
    let a = place(&mut ctx, order, product(1, 1), 3, 1);
    let b = place(&mut ctx, order, product(2, 1), 5, 2);

    assert!(ops.join_spaces(&mut ctx, a, b).unwrap());
    assert_eq!(ctx.mounted_spaces().len(), 1);
    assert_eq!(ctx.mounted_space(b).unwrap().occupation, dec(8));
    assert_eq!(ctx.spaces().len(), 1);
}

#[test]
fn test_join_spaces_rejects_overflow() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 10]);
    let ops = DomainOperations::new();
    let a = place(&mut ctx, order, product(1, 1), 6, 1);
    let b = place(&mut ctx, order, product(2, 1), 5, 2);
    assert!(!ops.join_spaces(&mut ctx, a, b).unwrap());
    assert_eq!(ctx.mounted_spaces().len(), 2);
}

#[test]
fn test_change_product_full_space_puts_fuller_load_on_larger_bay() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 8]);
    let ops = DomainOperations::new();
    // 小车位 6.25/8, 大车位 2/10
    let small = place(&mut ctx, order, product(1, 1), 5, 2);
    let large = place(&mut ctx, order, product(2, 1), 2, 1);

    assert!(ops.change_product_full_space(&mut ctx, large, small).unwrap());
    assert_eq!(ctx.mounted_space(large).unwrap().occupation, dec(5));
    assert_eq!(ctx.mounted_space(small).unwrap().occupation, Decimal::new(25, 1));
    // 再次调用不再改善
    assert!(!ops.change_product_full_space(&mut ctx, large, small).unwrap());
}

#[test]
fn test_change_product_balances_by_moving_products() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 10]);
    let ops = DomainOperations::new();
    let a = place(&mut ctx, order, product(1, 1), 6, 1);
    let item = ctx.add_item(order, Arc::new(product(2, 1)), 3).unwrap();
    ctx.add_product(key(1), item, 3, PlacementOptions::default())
        .unwrap();
    let b = place(&mut ctx, order, product(3, 1), 1, 2);

    assert!(ops.change_product(&mut ctx, a, b).unwrap());
    assert_eq!(ctx.mounted_space(a).unwrap().occupation, dec(6));
    assert_eq!(ctx.mounted_space(b).unwrap().occupation, dec(4));
}

// ==========================================
// 拆分
// ==========================================

#[test]
fn test_add_on_2_spaces_only_when_exhausted() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10, 10, 10]);
    let ops = DomainOperations::new();
    place(&mut ctx, order, product(1, 1), 6, 1);
    place(&mut ctx, order, product(2, 1), 7, 2);
    let item = ctx.add_item(order, Arc::new(product(3, 1)), 8).unwrap();

    // 4 + 3 < 8
    let first = PlacementTarget::Space(key(1));
    let second = PlacementTarget::Space(key(2));
    assert!(!ops.add_on_2_spaces(&mut ctx, item, first, second).unwrap());
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 8);

    // 4 + 10 >= 8
    let third = PlacementTarget::Space(key(3));
    assert!(ops.add_on_2_spaces(&mut ctx, item, first, third).unwrap());
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
    assert_eq!(ctx.mounted_space_by_key(key(1)).unwrap().occupation, dec(10));
    assert_eq!(ctx.mounted_space_by_key(key(3)).unwrap().occupation, dec(4));
}

#[test]
fn test_add_splitted_product_on_space() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), &[10]);
    let ops = DomainOperations::new();
    let item = ctx.add_item(order, Arc::new(product(1, 1)), 12).unwrap();
    assert!(ops
        .add_splitted_product_on_space(&mut ctx, item, PlacementTarget::Space(key(1)), 11)
        .unwrap()
        .is_none());
    let mp = ops
        .add_splitted_product_on_space(&mut ctx, item, PlacementTarget::Space(key(1)), 10)
        .unwrap()
        .unwrap();
    assert!(ctx.mounted_product(mp).unwrap().splitted);
    assert_eq!(ops.quantity_fitting(&ctx, PlacementTarget::Space(key(1)), item).unwrap(), 0);
}
