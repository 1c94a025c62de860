// ==========================================
// 车辆托盘装载引擎 - 编排器
// ==========================================
// 流程: 按地图类型选择规则链 -> 执行 -> 校验不变量 -> 生成装载结果
// 不变量:
// - 每个托盘 0 <= occupation <= size, 且等于其商品占用之和
// - 每个商品 amount == amount_remaining + Σ 已装载数量
// ==========================================

use crate::domain::input::PalletizeInput;
use crate::domain::order::OrderId;
use crate::domain::product::ProductCatalog;
use crate::domain::space::SpaceKey;
use crate::domain::types::MapKind;
use crate::engine::chains;
use crate::engine::context::PalletizeContext;
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::rule_chain::{ErrorPolicy, RuleChain, RuleChainReport};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// PalletizeSummary - 装载结果
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct PalletProductSummary {
    pub product_code: u32,
    pub product_name: String,
    pub amount: u32,
    pub occupation: Decimal,
    pub weight_kg: Decimal,
    pub layer: u32,
    pub assembly_sequence: Option<u32>,
    pub detached: bool,
    pub splitted: bool,
    pub realocated: bool,
    pub map_number: Option<String>,
    pub delivery_order: Option<u32>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PalletSummary {
    pub space: SpaceKey,
    pub size: Decimal,
    pub occupation: Decimal,
    pub occupation_percent: Decimal,
    pub weight_kg: Decimal,
    pub order: Option<OrderId>,
    pub products: Vec<PalletProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeftoverItem {
    pub product_code: u32,
    pub order: OrderId,
    pub amount: u32,
    pub detached: u32,
    pub reason: Option<String>,
}

/// 未装载商品（占位托盘）
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotPalletizedPallet {
    pub items: Vec<LeftoverItem>,
    pub total_amount: u32,
    pub weight_kg: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PalletizeSummary {
    pub run_id: Uuid,
    pub map_kind: MapKind,
    pub created_at: DateTime<Utc>,
    pub settings: serde_json::Value,
    pub chain: RuleChainReport,
    pub pallets: Vec<PalletSummary>,
    pub not_palletized: NotPalletizedPallet,
    pub total_occupation: Decimal,
}

impl PalletizeSummary {
    pub fn pallet_count(&self) -> usize {
        self.pallets.len()
    }

    pub fn is_fully_palletized(&self) -> bool {
        self.not_palletized.total_amount == 0
    }

    pub fn to_json(&self) -> PalletizeResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PalletizeError::Other(e.into()))
    }
}

// ==========================================
// Palletizer - 编排器
// ==========================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Palletizer {
    policy: ErrorPolicy,
}

impl Palletizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ErrorPolicy) -> Self {
        Self { policy }
    }

    /// 从输入文档构建上下文并执行
    pub fn palletize_input(
        &self,
        input: &PalletizeInput,
        catalog: &ProductCatalog,
        kind: MapKind,
    ) -> PalletizeResult<(PalletizeContext, PalletizeSummary)> {
        let mut ctx = PalletizeContext::from_input(input, catalog, kind)?;
        let summary = self.run(&mut ctx)?;
        Ok((ctx, summary))
    }

    /// 执行地图类型对应的规则链
    pub fn run(&self, ctx: &mut PalletizeContext) -> PalletizeResult<PalletizeSummary> {
        let chain = chains::for_kind(ctx.kind()).with_policy(self.policy);
        self.run_chain(ctx, &chain)
    }

    /// 执行指定规则链
    #[instrument(skip(self, ctx, chain), fields(kind = %ctx.kind(), chain = %chain.name()))]
    pub fn run_chain(&self, ctx: &mut PalletizeContext, chain: &RuleChain) -> PalletizeResult<PalletizeSummary> {
        let report = chain.execute_chain(ctx)?;
        validate_invariants(ctx)?;
        let summary = build_summary(ctx, report)?;
        if summary.is_fully_palletized() {
            info!(
                pallets = summary.pallet_count(),
                occupation = %summary.total_occupation,
                "装载完成"
            );
        } else {
            warn!(
                pallets = summary.pallet_count(),
                not_palletized = summary.not_palletized.total_amount,
                "装载完成, 存在未装载商品"
            );
        }
        Ok(summary)
    }
}

// ==========================================
// 不变量校验
// ==========================================

/// 校验容量与数量守恒
pub fn validate_invariants(ctx: &PalletizeContext) -> PalletizeResult<()> {
    for ms in ctx.all_mounted_spaces() {
        if ms.occupation < Decimal::ZERO || ms.occupation > ms.size() {
            return Err(PalletizeError::InvariantViolation(format!(
                "托盘占用越界: space={}, occupation={}, size={}",
                ms.key(),
                ms.occupation,
                ms.size()
            )));
        }
        let sum: Decimal = ctx.products_of(ms.id)?.iter().map(|mp| mp.occupation).sum();
        if sum != ms.occupation {
            return Err(PalletizeError::InvariantViolation(format!(
                "托盘占用与商品占用之和不一致: space={}, occupation={}, sum={}",
                ms.key(),
                ms.occupation,
                sum
            )));
        }
    }

    for item in ctx.all_items() {
        let placed = ctx.placed_amount_of(item.id);
        if item.amount != item.amount_remaining() + placed {
            return Err(PalletizeError::InvariantViolation(format!(
                "商品数量不守恒: code={}, amount={}, remaining={}, placed={}",
                item.code,
                item.amount,
                item.amount_remaining(),
                placed
            )));
        }
    }
    Ok(())
}

// ==========================================
// 结果构建
// ==========================================

fn build_summary(ctx: &PalletizeContext, chain: RuleChainReport) -> PalletizeResult<PalletizeSummary> {
    let mut pallets = Vec::new();
    for ms in ctx.all_mounted_spaces() {
        let mut products = Vec::new();
        let mut weight = Decimal::ZERO;
        let mut mounted = ctx.products_of(ms.id)?;
        mounted.sort_by_key(|mp| (mp.assembly_sequence.unwrap_or(u32::MAX), mp.id));
        for mp in mounted {
            let product = &ctx.item(mp.item)?.product;
            let product_weight = product.weight_kg * Decimal::from(mp.amount);
            weight += product_weight;
            products.push(PalletProductSummary {
                product_code: mp.product_code,
                product_name: product.name.clone(),
                amount: mp.amount,
                occupation: mp.occupation,
                weight_kg: product_weight,
                layer: mp.layer,
                assembly_sequence: mp.assembly_sequence,
                detached: mp.detached,
                splitted: mp.splitted,
                realocated: mp.realocated,
                map_number: mp.routing.as_ref().map(|r| r.map_number.clone()),
                delivery_order: mp.routing.as_ref().map(|r| r.delivery_order),
                license_plate: mp.routing.as_ref().and_then(|r| r.license_plate.clone()),
            });
        }
        if products.is_empty() {
            continue;
        }
        pallets.push(PalletSummary {
            space: ms.key(),
            size: ms.size(),
            occupation: ms.occupation,
            occupation_percent: ms.occupation_percent().round_dp(2),
            weight_kg: weight,
            order: ms.order,
            products,
        });
    }

    let mut not_palletized = NotPalletizedPallet::default();
    for item in ctx.non_palletized_items() {
        not_palletized.total_amount += item.amount_remaining();
        not_palletized.weight_kg += item.product.weight_kg * Decimal::from(item.amount_remaining());
        not_palletized.items.push(LeftoverItem {
            product_code: item.code,
            order: item.order_id,
            amount: item.amount_remaining(),
            detached: item.detached_remaining(),
            reason: item.non_palletizable_reason().map(str::to_string),
        });
    }

    let settings = serde_json::from_str(&ctx.settings().snapshot_json())
        .map_err(|e| PalletizeError::Other(e.into()))?;

    Ok(PalletizeSummary {
        run_id: chain.run_id,
        map_kind: ctx.kind(),
        created_at: Utc::now(),
        settings,
        chain,
        pallets,
        not_palletized,
        total_occupation: ctx.total_occupation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PalletizeSettings;
    use crate::domain::product::{PackingGroup, Product};
    use crate::domain::space::Space;
    use crate::domain::types::SpaceSide;
    use crate::engine::context::PlacementOptions;
    use std::sync::Arc;

    fn product(code: u32) -> Product {
        let mut p = Product::new(code, format!("P{}", code), PackingGroup::new(1, 1))
            .with_factor(Decimal::from(10), Decimal::ONE);
        p.weight_kg = Decimal::from(2);
        p
    }

    fn create_test_context(amount: u32) -> PalletizeContext {
        let mut ctx = PalletizeContext::new(MapKind::Common, PalletizeSettings::new());
        ctx.add_space(Space::new(1, SpaceSide::Driver, Decimal::from(10))).unwrap();
        ctx.add_space(Space::new(2, SpaceSide::Driver, Decimal::from(10))).unwrap();
        let order = ctx.add_order(1, "M1", "C1");
        ctx.add_item(order, Arc::new(product(1)), amount).unwrap();
        ctx
    }

    #[test]
    fn test_run_common_chain_places_everything() {
        let mut ctx = create_test_context(15);
        let summary = Palletizer::new().run(&mut ctx).unwrap();

        assert!(summary.is_fully_palletized());
        assert_eq!(summary.pallet_count(), 2);
        assert_eq!(summary.total_occupation, Decimal::from(15));
        let weight: Decimal = summary.pallets.iter().map(|p| p.weight_kg).sum();
        assert_eq!(weight, Decimal::from(30));
        assert!(summary.to_json().unwrap().contains("\"pallets\""));
    }

    #[test]
    fn test_leftover_goes_to_not_palletized_pallet() {
        let mut ctx = create_test_context(25);
        let summary = Palletizer::new().run(&mut ctx).unwrap();

        assert!(!summary.is_fully_palletized());
        assert_eq!(summary.not_palletized.total_amount, 5);
        assert_eq!(summary.not_palletized.items[0].reason.as_deref(), Some("NO_CAPACITY"));
    }

    #[test]
    fn test_validate_detects_conservation_break() {
        let mut ctx = create_test_context(5);
        let item = ctx.item_ids_with_remaining()[0];
        let mp = ctx
            .add_product(SpaceKey::new(1, SpaceSide::Driver), item, 5, PlacementOptions::default())
            .unwrap();
        assert!(validate_invariants(&ctx).is_ok());

        ctx.remove_mounted_product_amount(mp, 2).unwrap();
        let err = validate_invariants(&ctx).unwrap_err();
        assert!(matches!(err, PalletizeError::InvariantViolation(_)));
    }
}
