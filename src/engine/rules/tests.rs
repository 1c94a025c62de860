use super::*;
use crate::config::{config_keys, PalletizeSettings};
use crate::domain::item::{Item, ItemId};
use crate::domain::mounted::MountedSpaceId;
use crate::domain::order::OrderId;
use crate::domain::product::{PackingGroup, Product};
use crate::domain::space::{Space, SpaceKey};
use crate::domain::types::{MapKind, SafeSide, SpaceSide};
use crate::engine::context::{PalletizeContext, PlacementOptions};
use crate::engine::rule::Rule;
use crate::engine::rule_chain::RuleChain;
use rust_decimal::Decimal;
use std::sync::Arc;

// ==========================================
// 测试辅助函数
// ==========================================

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

fn key(number: u32) -> SpaceKey {
    SpaceKey::new(number, SpaceSide::Driver)
}

/// 尺寸 10 上 1 单位 = 1.0
fn product(code: u32, group: u32, sub_group: u32) -> Product {
    Product::new(code, format!("P{}", code), PackingGroup::new(group, sub_group))
        .with_factor(dec(10), Decimal::ONE)
}

fn create_test_context(settings: PalletizeSettings, spaces: usize) -> (PalletizeContext, OrderId) {
    let mut ctx = PalletizeContext::new(MapKind::Common, settings);
    for number in 1..=spaces {
        ctx.add_space(Space::new(number as u32, SpaceSide::Driver, dec(10)))
            .unwrap();
    }
    let order = ctx.add_order(1, "M1", "C1");
    (ctx, order)
}

fn add(ctx: &mut PalletizeContext, order: OrderId, p: Product, amount: u32) -> ItemId {
    ctx.add_item(order, Arc::new(p), amount).unwrap()
}

fn place(ctx: &mut PalletizeContext, order: OrderId, p: Product, amount: u32, space: u32) -> MountedSpaceId {
    let item = add(ctx, order, p, amount);
    ctx.add_product(key(space), item, amount, PlacementOptions::default())
        .unwrap();
    ctx.mounted_space_by_key(key(space)).unwrap().id
}

fn occupation_at(ctx: &PalletizeContext, space: u32) -> Decimal {
    ctx.mounted_space_by_key(key(space))
        .map(|ms| ms.occupation)
        .unwrap_or(Decimal::ZERO)
}

// ==========================================
// 整层 / 生啤
// ==========================================

#[test]
fn test_layer_rule_places_full_layers_only() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let item = add(&mut ctx, order, product(1, 1, 1).with_layer(4, 2), 10);

    LayerRule::new().execute(&mut ctx).unwrap();

    let layers: Vec<u32> = ctx.mounted_products_of_item(item).iter().map(|mp| mp.layer).collect();
    assert_eq!(layers, vec![1, 2]);
    assert_eq!(occupation_at(&ctx, 1), dec(8));
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 2);
}

#[test]
fn test_layer_rule_respects_max_layers() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 3);
    let item = add(&mut ctx, order, product(1, 1, 1).with_layer(2, 1), 6);

    LayerRule::new().execute(&mut ctx).unwrap();

    assert_eq!(ctx.mounted_spaces_with_occupation().len(), 3);
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
}

#[test]
fn test_chopp_rule_fills_existing_chopp_pallet_first() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let mut chopp = product(1, 1, 1);
    chopp.is_chopp = true;
    place(&mut ctx, order, chopp.clone(), 4, 1);
    let item = add(&mut ctx, order, chopp, 9);

    ChoppRule::new().execute(&mut ctx).unwrap();

    assert_eq!(occupation_at(&ctx, 1), dec(10));
    assert_eq!(occupation_at(&ctx, 2), dec(3));
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
}

// ==========================================
// 分组规则
// ==========================================

#[test]
fn test_sub_group_rule_co_locates_same_sub_group() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 3);
    add(&mut ctx, order, product(1, 1, 1), 3);
    add(&mut ctx, order, product(2, 1, 1), 4);
    add(&mut ctx, order, product(3, 2, 1), 5);

    PalletGroupSubGroupRule::new().execute(&mut ctx).unwrap();

    assert_eq!(occupation_at(&ctx, 1), dec(7));
    assert_eq!(occupation_at(&ctx, 2), dec(5));
    assert_eq!(occupation_at(&ctx, 3), Decimal::ZERO);
}

#[test]
fn test_group_rule_prefers_same_group_and_respects_limit() {
    let settings = PalletizeSettings::new()
        .with(config_keys::SHOULD_LIMIT_PACKAGE_GROUPS, true)
        .with(config_keys::MAX_PACKAGE_GROUPS, 1u32);
    let (mut ctx, order) = create_test_context(settings, 3);
    place(&mut ctx, order, product(1, 1, 1), 6, 1);
    place(&mut ctx, order, product(2, 2, 1), 3, 2);
    add(&mut ctx, order, product(3, 2, 2), 3);
    let other = add(&mut ctx, order, product(4, 3, 1), 3);

    PalletGroupRule::new().execute(&mut ctx).unwrap();

    assert_eq!(occupation_at(&ctx, 1), dec(6));
    assert_eq!(occupation_at(&ctx, 2), dec(6));
    assert_eq!(occupation_at(&ctx, 3), dec(3));
    assert_eq!(ctx.item(other).unwrap().amount_remaining(), 0);
}

// ==========================================
// 拆分 / 剩余
// ==========================================

#[test]
fn test_split_rule_divides_over_two_spaces() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let item = add(&mut ctx, order, product(1, 1, 1), 14);

    SplitItemsRule::new().execute(&mut ctx).unwrap();

    let parts = ctx.mounted_products_of_item(item);
    assert_eq!(parts.len(), 2);
    assert!(parts.iter().all(|mp| mp.splitted));
    assert_eq!(occupation_at(&ctx, 1), dec(10));
    assert_eq!(occupation_at(&ctx, 2), dec(4));
}

#[test]
fn test_split_rule_skips_small_division_and_remaining_rule_places_it() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let item = add(&mut ctx, order, product(1, 1, 1), 11);

    SplitItemsRule::new().execute(&mut ctx).unwrap();
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 11);

    RemainingItemsRule::new().execute(&mut ctx).unwrap();
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
    assert_eq!(occupation_at(&ctx, 1) + occupation_at(&ctx, 2), dec(11));
}

// ==========================================
// 散件
// ==========================================

fn detached_item(ctx: &mut PalletizeContext, order: OrderId, amount: u32, detached: u32) -> ItemId {
    let item = Item::new(ItemId(0), order, Arc::new(product(9, 1, 1)), amount, 1)
        .with_detached(detached)
        .unwrap();
    ctx.push_item(item).unwrap()
}

#[test]
fn test_detached_rule_uses_existing_pallet() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let item = detached_item(&mut ctx, order, 5, 2);
    ctx.add_product(key(1), item, 3, PlacementOptions::default()).unwrap();

    DetachedUnitsRule::new().execute(&mut ctx).unwrap();

    let item_ref = ctx.item(item).unwrap();
    assert_eq!(item_ref.amount_remaining(), 0);
    assert!(ctx.mounted_products_of_item(item).iter().any(|mp| mp.detached && mp.amount == 2));
    assert_eq!(ctx.mounted_spaces_with_occupation().len(), 1);
}

#[test]
fn test_detached_rule_opens_pallet_when_none_exists() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let item = detached_item(&mut ctx, order, 2, 2);

    DetachedUnitsRule::new().execute(&mut ctx).unwrap();

    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
    assert_eq!(occupation_at(&ctx, 1), dec(2));
}

#[test]
fn test_detached_rule_opens_pallet_when_existing_ones_are_full() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    place(&mut ctx, order, product(1, 1, 1), 10, 1);
    let item = detached_item(&mut ctx, order, 2, 2);

    DetachedUnitsRule::new().execute(&mut ctx).unwrap();

    let item_ref = ctx.item(item).unwrap();
    assert_eq!(item_ref.amount_remaining(), 0);
    assert_eq!(item_ref.non_palletizable_reason(), None);
    assert_eq!(occupation_at(&ctx, 2), dec(2));
}

#[test]
fn test_detached_rule_marks_unplaceable() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 1);
    place(&mut ctx, order, product(1, 1, 1), 10, 1);
    let item = detached_item(&mut ctx, order, 2, 2);

    DetachedUnitsRule::new().execute(&mut ctx).unwrap();

    let item_ref = ctx.item(item).unwrap();
    assert_eq!(item_ref.amount_remaining(), 2);
    assert_eq!(item_ref.non_palletizable_reason(), Some(NO_CAPACITY_FOR_DETACHED));
}

// ==========================================
// 合并 / 调换 / 均衡
// ==========================================

#[test]
fn test_join_rule_merges_pallets_of_same_group() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 3);
    place(&mut ctx, order, product(1, 1, 1), 3, 1);
    place(&mut ctx, order, product(2, 1, 2), 4, 2);
    place(&mut ctx, order, product(3, 2, 1), 2, 3);

    JoinGroupedSpacesRule::new().execute(&mut ctx).unwrap();

    let pallets = ctx.mounted_spaces_with_occupation();
    assert_eq!(pallets.len(), 2);
    assert_eq!(ctx.total_occupation(), dec(9));
    assert_eq!(occupation_at(&ctx, 3), dec(2));
}

#[test]
fn test_change_products_rule_balances_nearly_empty_pallet() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 2);
    let ms1 = place(&mut ctx, order, product(1, 1, 1), 6, 1);
    let item = add(&mut ctx, order, product(2, 1, 1), 3);
    ctx.add_product(ms1, item, 3, PlacementOptions::default()).unwrap();
    place(&mut ctx, order, product(3, 1, 1), 1, 2);

    ChangeProductsRule::new().execute(&mut ctx).unwrap();

    assert_eq!(occupation_at(&ctx, 1), dec(6));
    assert_eq!(occupation_at(&ctx, 2), dec(4));
}

#[test]
fn test_equalization_moves_minority_group() {
    let settings = PalletizeSettings::new().with(config_keys::PALLET_EQUALIZATION_RULE, true);
    let (mut ctx, order) = create_test_context(settings, 2);
    let ms1 = place(&mut ctx, order, product(1, 1, 1), 5, 1);
    let minority = add(&mut ctx, order, product(2, 2, 1), 3);
    ctx.add_product(ms1, minority, 3, PlacementOptions::default()).unwrap();

    let rule = PalletEqualizationRule::new();
    assert!(rule.should_execute(&ctx));
    rule.execute(&mut ctx).unwrap();

    assert_eq!(occupation_at(&ctx, 1), dec(5));
    assert_eq!(occupation_at(&ctx, 2), dec(3));
    assert!(ctx.mounted_products_of_item(minority).iter().all(|mp| mp.realocated));
}

#[test]
fn test_equalization_disabled_by_default() {
    let (ctx, _) = create_test_context(PalletizeSettings::new(), 2);
    assert!(!PalletEqualizationRule::new().should_execute(&ctx));
}

// ==========================================
// 安全侧
// ==========================================

#[test]
fn test_safe_side_moves_pallet_to_required_side() {
    let settings = PalletizeSettings::new().with(config_keys::ENABLE_SAFE_SIDE_RULE, true);
    let mut ctx = PalletizeContext::new(MapKind::Common, settings);
    ctx.add_space(Space::new(1, SpaceSide::Driver, dec(10))).unwrap();
    ctx.add_space(Space::new(1, SpaceSide::Helper, dec(10))).unwrap();
    let order = ctx.add_order(1, "M1", "C1");
    let mut item = Item::new(ItemId(0), order, Arc::new(product(1, 1, 1)), 4, 1);
    item.safe_side = SafeSide::Driver;
    let item = ctx.push_item(item).unwrap();
    ctx.add_product(SpaceKey::new(1, SpaceSide::Helper), item, 4, PlacementOptions::default())
        .unwrap();

    SafeSideRule::new().execute(&mut ctx).unwrap();

    let pallets = ctx.mounted_spaces_with_occupation();
    assert_eq!(pallets.len(), 1);
    assert_eq!(pallets[0].space.side, SpaceSide::Driver);
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
}

/// 每个商品使用独立配送单（配送单号 = 商品编码）, 安全侧互不影响
fn safe_side_item(ctx: &mut PalletizeContext, order: OrderId, code: u32, amount: u32, side: SafeSide) -> ItemId {
    let mut item = Item::new(ItemId(0), order, Arc::new(product(code, 1, 1)), amount, code);
    item.safe_side = side;
    ctx.push_item(item).unwrap()
}

fn side_of_item(ctx: &PalletizeContext, item: ItemId) -> SpaceKey {
    let mp = ctx.mounted_products_of_item(item)[0].id;
    let ms = ctx.mounted_space_of_product(mp).unwrap();
    ctx.mounted_space(ms).unwrap().key()
}

#[test]
fn test_safe_side_moves_pallet_to_other_bay() {
    let settings = PalletizeSettings::new().with(config_keys::ENABLE_SAFE_SIDE_RULE, true);
    let mut ctx = PalletizeContext::new(MapKind::Common, settings);
    ctx.add_space(Space::new(1, SpaceSide::Driver, dec(10))).unwrap();
    ctx.add_space(Space::new(2, SpaceSide::Helper, dec(10))).unwrap();
    let order = ctx.add_order(1, "M1", "C1");
    let item = safe_side_item(&mut ctx, order, 1, 4, SafeSide::Helper);
    ctx.add_product(key(1), item, 4, PlacementOptions::default()).unwrap();

    SafeSideRule::new().execute(&mut ctx).unwrap();

    let pallets = ctx.mounted_spaces_with_occupation();
    assert_eq!(pallets.len(), 1);
    assert_eq!(pallets[0].key(), SpaceKey::new(2, SpaceSide::Helper));
    assert_eq!(ctx.item(item).unwrap().amount_remaining(), 0);
}

#[test]
fn test_safe_side_exchanges_pallets_across_bays() {
    let settings = PalletizeSettings::new().with(config_keys::ENABLE_SAFE_SIDE_RULE, true);
    let mut ctx = PalletizeContext::new(MapKind::Common, settings);
    ctx.add_space(Space::new(1, SpaceSide::Driver, dec(10))).unwrap();
    ctx.add_space(Space::new(2, SpaceSide::Helper, dec(10))).unwrap();
    let order = ctx.add_order(1, "M1", "C1");
    let helper_item = safe_side_item(&mut ctx, order, 1, 4, SafeSide::Helper);
    let driver_item = safe_side_item(&mut ctx, order, 2, 6, SafeSide::Driver);
    ctx.add_product(key(1), helper_item, 4, PlacementOptions::default()).unwrap();
    ctx.add_product(SpaceKey::new(2, SpaceSide::Helper), driver_item, 6, PlacementOptions::default())
        .unwrap();

    SafeSideRule::new().execute(&mut ctx).unwrap();

    assert_eq!(side_of_item(&ctx, helper_item), SpaceKey::new(2, SpaceSide::Helper));
    assert_eq!(side_of_item(&ctx, driver_item), key(1));
    assert_eq!(ctx.total_occupation(), dec(10));
}

#[test]
fn test_safe_side_no_improvement_is_noop() {
    let settings = PalletizeSettings::new().with(config_keys::ENABLE_SAFE_SIDE_RULE, true);
    let (mut ctx, order) = create_test_context(settings, 1);
    let ms = place(&mut ctx, order, product(1, 1, 1), 4, 1);

    SafeSideRule::new().execute(&mut ctx).unwrap();

    assert_eq!(ctx.mounted_space(ms).unwrap().key(), key(1));
}

// ==========================================
// 未装载 / 分订单
// ==========================================

#[test]
fn test_non_palletized_rule_records_reason() {
    let (mut ctx, order) = create_test_context(PalletizeSettings::new(), 1);
    let item = add(&mut ctx, order, product(1, 1, 1), 12);
    ctx.add_product(key(1), item, 10, PlacementOptions::default()).unwrap();

    NonPalletizedRule::new().execute(&mut ctx).unwrap();

    assert_eq!(ctx.item(item).unwrap().non_palletizable_reason(), Some(NO_CAPACITY));
    assert!(ctx.items_with_remaining().is_empty());
}

#[test]
fn test_per_order_rule_keeps_pallets_exclusive() {
    let (mut ctx, first) = create_test_context(PalletizeSettings::new(), 2);
    let second = ctx.add_order(2, "M1", "C2");
    add(&mut ctx, first, product(1, 1, 1), 3);
    add(&mut ctx, second, product(2, 1, 1), 3);

    let rule = PerOrderRule::new(
        OrderGrouping::ByOrder,
        RuleChain::new("sub").rule(PalletGroupSubGroupRule::new()),
    );
    rule.execute(&mut ctx).unwrap();

    assert_eq!(ctx.filter_depth(), 0);
    let owners: Vec<Option<OrderId>> = ctx.mounted_spaces().iter().map(|ms| ms.order).collect();
    assert_eq!(owners, vec![Some(first), Some(second)]);
}

#[test]
fn test_per_order_rule_groups_by_support_point() {
    let (mut ctx, first) = create_test_context(PalletizeSettings::new(), 2);
    let second = ctx.add_order(2, "M1", "C2");
    add(&mut ctx, first, product(1, 1, 1), 3);
    add(&mut ctx, second, product(2, 1, 1), 3);

    let rule = PerOrderRule::new(
        OrderGrouping::BySupportPoint,
        RuleChain::new("sub").rule(PalletGroupSubGroupRule::new()),
    );
    rule.execute(&mut ctx).unwrap();

    // 两个订单同属地图 M1, 共用托盘
    assert_eq!(ctx.mounted_spaces_with_occupation().len(), 1);
    assert_eq!(occupation_at(&ctx, 1), dec(6));
}
