// ==========================================
// 领域操作 - 拆分装载
// ==========================================
// 红线: 只有两处容量合计能装完剩余整箱数量时才拆分
// ==========================================

use crate::domain::item::ItemId;
use crate::domain::mounted::MountedProductId;
use crate::engine::context::{PalletizeContext, PlacementOptions, PlacementTarget};
use crate::engine::error::PalletizeResult;
use tracing::debug;

use super::core::DomainOperations;

impl DomainOperations {
    /// 目标剩余容量最多可放入的数量（装载规则不满足时为 0）
    pub fn quantity_fitting(
        &self,
        ctx: &PalletizeContext,
        target: PlacementTarget,
        item: ItemId,
    ) -> PalletizeResult<u32> {
        let Ok(resolved) = ctx.resolve_target(target) else {
            return Ok(0);
        };
        let item_ref = ctx.item(item)?;
        if let Some(ms) = resolved.mounted_space {
            if !self.can_add_basic(ctx, ms, &item_ref.product)? {
                return Ok(0);
            }
        }
        self.converter.quantity_to_remaining_space(
            resolved.space.size,
            resolved.occupation,
            item_ref,
            ctx.apply_height_adjustment(),
        )
    }

    /// 把商品剩余整箱数量拆到两个车位
    ///
    /// # 返回
    /// - `Ok(false)`: 两处合计装不完, 不做任何修改
    pub fn add_on_2_spaces(
        &self,
        ctx: &mut PalletizeContext,
        item: ItemId,
        first: PlacementTarget,
        second: PlacementTarget,
    ) -> PalletizeResult<bool> {
        let remaining = ctx.item(item)?.packed_remaining();
        if remaining == 0 {
            return Ok(false);
        }
        let first_resolved = ctx.resolve_target(first).ok().map(|r| r.space.key());
        let second_resolved = ctx.resolve_target(second).ok().map(|r| r.space.key());
        if first_resolved.is_none() || first_resolved == second_resolved {
            return Ok(false);
        }

        let q1 = self.quantity_fitting(ctx, first, item)?.min(remaining);
        let q2 = self.quantity_fitting(ctx, second, item)?.min(remaining - q1);
        if q1 + q2 < remaining {
            return Ok(false);
        }

        let opts = if q1 > 0 && q2 > 0 {
            PlacementOptions::splitted()
        } else {
            PlacementOptions::default()
        };
        if q1 > 0 {
            ctx.add_product(first, item, q1, opts)?;
        }
        if q2 > 0 {
            ctx.add_product(second, item, q2, opts)?;
        }
        debug!(item = item.0, first = q1, second = q2, "拆分装载到两个车位");
        Ok(true)
    }

    /// 在目标上装载拆分的一部分数量
    ///
    /// # 返回
    /// - `Ok(None)`: 该数量装不下或不满足装载规则
    pub fn add_splitted_product_on_space(
        &self,
        ctx: &mut PalletizeContext,
        item: ItemId,
        target: PlacementTarget,
        quantity: u32,
    ) -> PalletizeResult<Option<MountedProductId>> {
        if quantity == 0 || quantity > ctx.item(item)?.packed_remaining() {
            return Ok(None);
        }
        if !self.can_add(ctx, target, item, quantity)? {
            return Ok(None);
        }
        let id = ctx.add_product(target, item, quantity, PlacementOptions::splitted())?;
        Ok(Some(id))
    }
}
