// ==========================================
// 领域操作 - 两托盘重平衡
// ==========================================
// change_product_full_space: 整托互换, 仅当百分比差距严格减小
// join_spaces: 一托并入另一托, 释放一个车位
// change_product: 逐个把商品从较满托盘移到较空托盘, 直到差距不再减小
// ==========================================

use crate::domain::mounted::{MountedProductId, MountedSpaceId};
use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::error::PalletizeResult;
use rust_decimal::Decimal;
use tracing::debug;

use super::core::DomainOperations;

fn percent(occupation: Decimal, size: Decimal) -> Decimal {
    if size <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        occupation * Decimal::ONE_HUNDRED / size
    }
}

impl DomainOperations {
    /// 两托盘整托互换（占用随尺寸变化）
    ///
    /// # 返回
    /// - `Ok(true)`: 已互换
    /// - `Ok(false)`: 装不下或互换后不更均衡
    pub fn change_product_full_space(
        &self,
        ctx: &mut PalletizeContext,
        a: MountedSpaceId,
        b: MountedSpaceId,
    ) -> PalletizeResult<bool> {
        if a == b {
            return Ok(false);
        }
        let (size_a, occ_a) = {
            let ms = ctx.mounted_space(a)?;
            (ms.size(), ms.occupation)
        };
        let (size_b, occ_b) = {
            let ms = ctx.mounted_space(b)?;
            (ms.size(), ms.occupation)
        };
        let swapped_a = self.recomputed_occupation(ctx, b, size_a)?;
        let swapped_b = self.recomputed_occupation(ctx, a, size_b)?;
        if swapped_a > size_a || swapped_b > size_b {
            return Ok(false);
        }

        let before = (percent(occ_a, size_a) - percent(occ_b, size_b)).abs();
        let after = (percent(swapped_a, size_a) - percent(swapped_b, size_b)).abs();
        if after >= before {
            return Ok(false);
        }
        ctx.switch_products(a, b)?;
        debug!(a = a.0, b = b.0, before = %before, after = %after, "整托互换");
        Ok(true)
    }

    /// 尝试把一托并入另一托
    ///
    /// 两个方向都可行时选结果占用百分比较低的方向, 相同时并入较空托盘的一方
    pub fn join_spaces(
        &self,
        ctx: &mut PalletizeContext,
        a: MountedSpaceId,
        b: MountedSpaceId,
    ) -> PalletizeResult<bool> {
        if a == b {
            return Ok(false);
        }
        let occ_a = ctx.mounted_space(a)?.occupation;
        let occ_b = ctx.mounted_space(b)?.occupation;
        // 较空托盘优先作为来源
        let directions = if occ_a <= occ_b { [(a, b), (b, a)] } else { [(b, a), (a, b)] };

        let mut best: Option<(MountedSpaceId, MountedSpaceId, Decimal)> = None;
        for (from, to) in directions {
            if !self.can_add_mounted_space_to_mounted_space(ctx, from, to)? {
                continue;
            }
            let target = ctx.mounted_space(to)?;
            let incoming = self.recomputed_occupation(ctx, from, target.size())?;
            let result = percent(target.occupation + incoming, target.size());
            if best.map_or(true, |(_, _, p)| result < p) {
                best = Some((from, to, result));
            }
        }

        let Some((from, to, result)) = best else {
            return Ok(false);
        };
        let outcome = self.move_all_products(ctx, from, PlacementTarget::MountedSpace(to))?;
        if outcome.is_moved() {
            debug!(from = from.0, to = to.0, percent = %result, "合并托盘");
        }
        Ok(outcome.is_moved())
    }

    /// 逐个移动整条商品以平衡两托盘的占用百分比
    pub fn change_product(
        &self,
        ctx: &mut PalletizeContext,
        a: MountedSpaceId,
        b: MountedSpaceId,
    ) -> PalletizeResult<bool> {
        if a == b {
            return Ok(false);
        }
        let mut changed = false;
        loop {
            let (Ok(ms_a), Ok(ms_b)) = (ctx.mounted_space(a), ctx.mounted_space(b)) else {
                break;
            };
            let (fuller, emptier) = if ms_a.occupation_percent() >= ms_b.occupation_percent() {
                (ms_a, ms_b)
            } else {
                (ms_b, ms_a)
            };
            let before = fuller.occupation_percent() - emptier.occupation_percent();
            let (fuller_id, fuller_size, fuller_occ) = (fuller.id, fuller.size(), fuller.occupation);
            let (emptier_id, emptier_size, emptier_occ) = (emptier.id, emptier.size(), emptier.occupation);

            let mut candidates: Vec<(MountedProductId, Decimal)> = ctx
                .products_of(fuller_id)?
                .iter()
                .map(|mp| (mp.id, mp.occupation))
                .collect();
            candidates.sort_by(|x, y| x.1.cmp(&y.1).then(x.0.cmp(&y.0)));

            let mut moved = false;
            for (mp_id, occupation) in candidates {
                let mp = ctx.mounted_product(mp_id)?.clone();
                let incoming = ctx.occupation_on_size(&mp, emptier_size)?;
                let after = (percent(fuller_occ - occupation, fuller_size)
                    - percent(emptier_occ + incoming, emptier_size))
                .abs();
                if after >= before {
                    continue;
                }
                let outcome = self.move_mounted_product(
                    ctx,
                    mp_id,
                    mp.amount,
                    PlacementTarget::MountedSpace(emptier_id),
                )?;
                if outcome.is_moved() {
                    moved = true;
                    break;
                }
            }
            if !moved {
                break;
            }
            changed = true;
        }
        Ok(changed)
    }
}
