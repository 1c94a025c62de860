// ==========================================
// 地图类型规则链集成测试
// ==========================================
// 每种地图类型: 完整执行 -> 不变量成立 -> 地图语义
// ==========================================

mod helpers;

use helpers::{init_logging, ContextBuilder, ProductBuilder};
use pallet_mounting::domain::types::MapKind;
use pallet_mounting::engine::chains;
use pallet_mounting::engine::rules::ReorderRule;
use pallet_mounting::engine::{validate_invariants, PalletizeContext, Palletizer, RuleChain, RuleOutcome};

/// 两个订单, 三个车位号（共 6 个车位）
fn create_two_order_context(kind: MapKind) -> PalletizeContext {
    let mut builder = ContextBuilder::new(kind).bays(3, 10);
    let first = builder.order(1, "M1", "C1");
    let second = builder.order(2, "M2", "C2");
    builder.item(first, ProductBuilder::new(1).group(1, 1).build(), 6);
    builder.item(first, ProductBuilder::new(2).group(2, 1).build(), 3);
    builder.item(second, ProductBuilder::new(1).group(1, 1).build(), 4);
    builder.item(second, ProductBuilder::new(3).group(1, 2).build(), 5);
    builder.build()
}

#[test]
fn test_every_map_kind_places_everything() {
    init_logging();
    for kind in [
        MapKind::Route,
        MapKind::As,
        MapKind::Mixed,
        MapKind::CrossDocking,
        MapKind::T4,
        MapKind::Common,
    ] {
        let mut ctx = create_two_order_context(kind);
        let summary = Palletizer::new().run(&mut ctx).unwrap();

        assert!(summary.is_fully_palletized(), "kind={}", kind);
        assert_eq!(summary.map_kind, kind);
        assert_eq!(summary.chain.chain, kind.as_str());
        assert!(summary.chain.failures().is_empty(), "kind={}", kind);
        validate_invariants(&ctx).unwrap();
    }
}

#[test]
fn test_route_restores_original_orders() {
    let mut ctx = create_two_order_context(MapKind::Route);
    Palletizer::new().run(&mut ctx).unwrap();

    assert!(!ctx.is_merged());
    let orders: Vec<_> = ctx.orders().into_iter().cloned().collect();
    assert_eq!(orders.len(), 2);
    for order in &orders {
        for id in &order.items {
            let item = ctx.item(*id).unwrap();
            assert_eq!(item.amount_remaining(), 0);
            let mounted = ctx.mounted_products_of_item(*id);
            let placed: u32 = mounted.iter().map(|mp| mp.amount).sum();
            assert_eq!(placed, item.amount);
            for mp in mounted {
                let routing = mp.routing.as_ref().unwrap();
                assert_eq!(routing.map_number, order.map_number);
            }
        }
    }
    assert!(ctx.all_mounted_spaces().iter().all(|ms| ms.order.is_none()));
}

#[test]
fn test_as_pallets_belong_to_single_order() {
    let mut ctx = create_two_order_context(MapKind::As);
    Palletizer::new().run(&mut ctx).unwrap();

    for ms in ctx.all_mounted_spaces() {
        let owner = ms.order.unwrap();
        for mp in ctx.products_of(ms.id).unwrap() {
            assert_eq!(ctx.item(mp.item).unwrap().order_id, owner);
        }
    }
}

#[test]
fn test_mixed_layers_exclusive_rest_shared() {
    let mut builder = ContextBuilder::new(MapKind::Mixed).bays(2, 10);
    let first = builder.order(1, "M1", "C1");
    let second = builder.order(2, "M2", "C2");
    let layered = builder.item(first, ProductBuilder::new(1).layer(5, 2).build(), 10);
    let loose = builder.item(second, ProductBuilder::new(2).build(), 4);
    let mut ctx = builder.build();

    let summary = Palletizer::new().run(&mut ctx).unwrap();
    assert!(summary.is_fully_palletized());

    let layer_products = ctx.mounted_products_of_item(layered);
    assert_eq!(layer_products.len(), 2);
    let layer_ms = ctx.mounted_space_of_product(layer_products[0].id).unwrap();
    assert_eq!(ctx.mounted_space(layer_ms).unwrap().order, Some(first));

    let loose_mp = ctx.mounted_products_of_item(loose)[0].id;
    let loose_ms = ctx.mounted_space_of_product(loose_mp).unwrap();
    assert_ne!(loose_ms, layer_ms);
    assert_eq!(ctx.mounted_space(loose_ms).unwrap().order, None);
}

#[test]
fn test_cross_docking_runs_per_support_point() {
    let mut ctx = create_two_order_context(MapKind::CrossDocking);
    let summary = Palletizer::new().run(&mut ctx).unwrap();

    assert_eq!(summary.chain.outcome_of("PerOrderRule"), Some(&RuleOutcome::Executed));
    assert!(summary.is_fully_palletized());
}

#[test]
fn test_reorder_is_idempotent_after_full_run() {
    let mut ctx = create_two_order_context(MapKind::Common);
    Palletizer::new().run(&mut ctx).unwrap();

    let sequences = |ctx: &PalletizeContext| -> Vec<(u32, Option<u32>)> {
        ctx.all_mounted_spaces()
            .iter()
            .flat_map(|ms| ctx.products_of(ms.id).unwrap())
            .map(|mp| (mp.id.0, mp.assembly_sequence))
            .collect()
    };
    let before = sequences(&ctx);
    assert!(before.iter().all(|(_, seq)| seq.is_some()));

    RuleChain::new("reorder_again")
        .rule(ReorderRule::new())
        .execute_chain(&mut ctx)
        .unwrap();
    assert_eq!(sequences(&ctx), before);
}

#[test]
fn test_for_kind_chain_names() {
    assert_eq!(chains::for_kind(MapKind::T4).name(), "t4");
    assert_eq!(chains::for_kind(MapKind::Route).name(), "route");
    assert!(chains::route().rule_names().contains(&"MergeOrdersRule"));
    assert!(chains::route().rule_names().contains(&"UnmergeOrdersRule"));
}
