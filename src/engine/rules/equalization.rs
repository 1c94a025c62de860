// ==========================================
// 托盘均衡规则
// ==========================================
// 适用: 占用百分比 >= PalletEqualizationMinOccupationPercent 且含多个分组（或多个商品）的托盘
// 少数部分 = 除占用最大分组外的全部商品, 占比 >= PalletEqualizationMinorityPercent 才拆
// 目标: 空车位中拆分结果最接近 50/50 的一个
// ==========================================

use crate::config::{config_keys, defaults};
use crate::domain::mounted::{MountedProductId, MountedSpaceId};
use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct PalletEqualizationRule {
    base: BaseRule,
    ops: DomainOperations,
}

/// 一个托盘的拆分方案
struct Split {
    minority: Vec<MountedProductId>,
    minority_occupation: Decimal,
    total: Decimal,
}

impl PalletEqualizationRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::gated("PalletEqualizationRule", config_keys::PALLET_EQUALIZATION_RULE, false),
            ops: DomainOperations::new(),
        }
    }

    /// 按分组划分, 只有一个分组时按商品划分
    fn split_of(&self, ctx: &PalletizeContext, ms: MountedSpaceId) -> PalletizeResult<Option<Split>> {
        let products = ctx.products_of(ms)?;
        let mut by_group: BTreeMap<u32, Vec<(MountedProductId, Decimal)>> = BTreeMap::new();
        let mut by_item: BTreeMap<usize, Vec<(MountedProductId, Decimal)>> = BTreeMap::new();
        for mp in &products {
            let group = ctx.item(mp.item)?.packing_group_code();
            by_group.entry(group).or_default().push((mp.id, mp.occupation));
            by_item.entry(mp.item.0).or_default().push((mp.id, mp.occupation));
        }
        let parts: Vec<Vec<(MountedProductId, Decimal)>> = if by_group.len() >= 2 {
            by_group.into_values().collect()
        } else if by_item.len() >= 2 {
            by_item.into_values().collect()
        } else {
            return Ok(None);
        };

        let total: Decimal = parts.iter().flatten().map(|(_, o)| *o).sum();
        if total <= Decimal::ZERO {
            return Ok(None);
        }
        // 占用最大的部分留在原托盘, 同占用保留先出现的
        let mut majority = 0;
        let mut best = Decimal::MIN;
        for (i, part) in parts.iter().enumerate() {
            let occ: Decimal = part.iter().map(|(_, o)| *o).sum();
            if occ > best {
                best = occ;
                majority = i;
            }
        }
        let minority: Vec<(MountedProductId, Decimal)> = parts
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != majority)
            .flat_map(|(_, p)| p)
            .collect();
        let minority_occupation = minority.iter().map(|(_, o)| *o).sum();
        Ok(Some(Split {
            minority: minority.into_iter().map(|(id, _)| id).collect(),
            minority_occupation,
            total,
        }))
    }

    /// 最接近 50/50 的空车位
    fn best_target(
        &self,
        ctx: &PalletizeContext,
        split: &Split,
    ) -> PalletizeResult<Option<PlacementTarget>> {
        let half = Decimal::new(5, 1);
        let staying = split.total - split.minority_occupation;
        let mut best: Option<(PlacementTarget, Decimal)> = None;
        for space in ctx.spaces_without_occupation() {
            let mut moved = Decimal::ZERO;
            for id in &split.minority {
                let mp = ctx.mounted_product(*id)?;
                moved += ctx.occupation_on_size(mp, space.size)?;
            }
            if moved > space.size || moved + staying <= Decimal::ZERO {
                continue;
            }
            let distance = (moved / (moved + staying) - half).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((PlacementTarget::Space(space.key()), distance));
            }
        }
        Ok(best.map(|(t, _)| t))
    }
}

impl Default for PalletEqualizationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PalletEqualizationRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        self.base.is_enabled(ctx) && !ctx.spaces_without_occupation().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let min_occupation: Decimal = ctx.get_setting(
            config_keys::PALLET_EQUALIZATION_MIN_OCCUPATION_PERCENT,
            Decimal::from(defaults::PALLET_EQUALIZATION_MIN_OCCUPATION_PERCENT),
        );
        let minority_percent: Decimal = ctx.get_setting(
            config_keys::PALLET_EQUALIZATION_MINORITY_PERCENT,
            Decimal::from(defaults::PALLET_EQUALIZATION_MINORITY_PERCENT),
        );

        let candidates: Vec<MountedSpaceId> = ctx
            .mounted_spaces_with_occupation()
            .into_iter()
            .filter(|ms| ms.occupation_percent() >= min_occupation)
            .map(|ms| ms.id)
            .collect();

        let mut equalized = 0usize;
        for ms in candidates {
            let Some(split) = self.split_of(ctx, ms)? else {
                continue;
            };
            let share = split.minority_occupation * Decimal::ONE_HUNDRED / split.total;
            if share < minority_percent {
                debug!(ms = ms.0, share = %share, "少数部分占比不足, 不拆分");
                continue;
            }
            let Some(target) = self.best_target(ctx, &split)? else {
                continue;
            };
            let outcome = self.ops.move_mounted_products(ctx, ms, &split.minority, target)?;
            if outcome.is_moved() {
                equalized += 1;
            }
        }
        if equalized > 0 {
            info!(equalized, "托盘均衡完成");
        }
        Ok(())
    }
}
