// ==========================================
// 包装分组规则
// ==========================================
// PalletGroupSubGroupRule: 按 (分组, 子分组) 归并, 同子分组托盘优先, 否则开新托盘
// PalletGroupRule: 余下商品并入同分组托盘, 其次任意可关联托盘, 最后空车位
// 两者都只整条放置, 放不下的留给拆分规则; 共存约束全部由 CanAdd 判断
// ==========================================

use crate::domain::item::ItemId;
use crate::engine::context::{PalletizeContext, PlacementOptions, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::support::{empty_spaces, estimated_occupation, partial_pallets_best_fit, place_whole};

/// 含指定商品属性的未满托盘（最合适的在前）
fn pallets_matching(
    ctx: &PalletizeContext,
    matches: impl Fn(u32, u32) -> bool,
) -> PalletizeResult<Vec<PlacementTarget>> {
    let mut result = Vec::new();
    for target in partial_pallets_best_fit(ctx) {
        let PlacementTarget::MountedSpace(ms) = target else {
            continue;
        };
        let found = ctx
            .products_catalog_of(ms)?
            .iter()
            .any(|p| matches(p.packing_group.group_code, p.packing_group.sub_group_code));
        if found {
            result.push(target);
        }
    }
    Ok(result)
}

fn packed_items(ctx: &PalletizeContext) -> Vec<ItemId> {
    ctx.item_ids_with_packed_remaining()
}

// ==========================================
// PalletGroupSubGroupRule
// ==========================================
pub struct PalletGroupSubGroupRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl PalletGroupSubGroupRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("PalletGroupSubGroupRule"),
            ops: DomainOperations::new(),
        }
    }

    /// 按 (分组, 子分组) 分桶, 桶按合计占用降序, 桶内按商品占用降序
    fn buckets(&self, ctx: &PalletizeContext) -> PalletizeResult<Vec<((u32, u32), Vec<ItemId>)>> {
        let mut map: BTreeMap<(u32, u32), Vec<(ItemId, Decimal)>> = BTreeMap::new();
        for id in packed_items(ctx) {
            let pg = ctx.item(id)?.product.packing_group;
            map.entry((pg.group_code, pg.sub_group_code))
                .or_default()
                .push((id, estimated_occupation(ctx, id)));
        }
        let mut buckets: Vec<((u32, u32), Decimal, Vec<ItemId>)> = map
            .into_iter()
            .map(|(key, mut items)| {
                items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                let total = items.iter().map(|(_, o)| *o).sum();
                (key, total, items.into_iter().map(|(id, _)| id).collect())
            })
            .collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(buckets.into_iter().map(|(k, _, items)| (k, items)).collect())
    }
}

impl Default for PalletGroupSubGroupRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PalletGroupSubGroupRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !packed_items(ctx).is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        for ((group, sub_group), items) in self.buckets(ctx)? {
            for id in items {
                let same = pallets_matching(ctx, |g, s| g == group && s == sub_group)?;
                if place_whole(&self.ops, ctx, id, &same, PlacementOptions::default())? {
                    continue;
                }
                let spaces = empty_spaces(ctx);
                if place_whole(&self.ops, ctx, id, &spaces, PlacementOptions::default())? {
                    debug!(group, sub_group, item = id.0, "子分组开新托盘");
                }
            }
        }
        Ok(())
    }
}

// ==========================================
// PalletGroupRule
// ==========================================
pub struct PalletGroupRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl PalletGroupRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("PalletGroupRule"),
            ops: DomainOperations::new(),
        }
    }
}

impl Default for PalletGroupRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PalletGroupRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !packed_items(ctx).is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let mut ids = packed_items(ctx);
        super::support::sort_by_occupation_desc(ctx, &mut ids);
        for id in ids {
            let group = ctx.item(id)?.packing_group_code();
            let mut targets = pallets_matching(ctx, |g, _| g == group)?;
            for other in partial_pallets_best_fit(ctx) {
                if !targets.contains(&other) {
                    targets.push(other);
                }
            }
            targets.extend(empty_spaces(ctx));
            place_whole(&self.ops, ctx, id, &targets, PlacementOptions::default())?;
        }
        Ok(())
    }
}
