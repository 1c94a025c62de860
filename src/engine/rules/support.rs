// ==========================================
// 规则公共工具
// ==========================================
// 候选目标排序与通用装载动作, 供各装载规则复用
// ==========================================

use crate::domain::item::ItemId;
use crate::engine::context::{PalletizeContext, PlacementOptions, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::factor_converter::SizeOrFactor;
use rust_decimal::Decimal;

/// 商品剩余数量在最大可用尺寸上的估算占用（用于排序, 缺系数时为 0）
pub(crate) fn estimated_occupation(ctx: &PalletizeContext, item: ItemId) -> Decimal {
    let Ok(item) = ctx.item(item) else {
        return Decimal::ZERO;
    };
    let Ok(size) = ctx.largest_size_with_factor(item) else {
        return Decimal::ZERO;
    };
    ctx.converter()
        .occupation(
            item.amount_remaining(),
            SizeOrFactor::Size(size),
            item,
            ctx.apply_height_adjustment(),
        )
        .unwrap_or(Decimal::ZERO)
}

/// 按估算占用降序, 同占用按商品代码
pub(crate) fn sort_by_occupation_desc(ctx: &PalletizeContext, ids: &mut [ItemId]) {
    let mut keyed: Vec<(ItemId, Decimal, u32)> = ids
        .iter()
        .map(|id| {
            let code = ctx.item(*id).map(|i| i.code).unwrap_or(0);
            (*id, estimated_occupation(ctx, *id), code)
        })
        .collect();
    keyed.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0)));
    for (slot, (id, _, _)) in ids.iter_mut().zip(keyed) {
        *slot = id;
    }
}

pub(crate) fn remaining_capacity(ctx: &PalletizeContext, target: PlacementTarget) -> Decimal {
    ctx.resolve_target(target)
        .map(|r| (r.space.size - r.occupation).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
}

/// 有内容且未满的托盘（按剩余容量升序, 最合适的在前）
pub(crate) fn partial_pallets_best_fit(ctx: &PalletizeContext) -> Vec<PlacementTarget> {
    let mut list: Vec<(PlacementTarget, Decimal)> = ctx
        .mounted_spaces()
        .into_iter()
        .filter(|ms| ms.occupation > Decimal::ZERO && !ms.is_full())
        .map(|ms| (PlacementTarget::MountedSpace(ms.id), ms.remaining_capacity()))
        .collect();
    list.sort_by(|a, b| a.1.cmp(&b.1));
    list.into_iter().map(|(t, _)| t).collect()
}

/// 空车位（车位号升序, 司机侧在前）
pub(crate) fn empty_spaces(ctx: &PalletizeContext) -> Vec<PlacementTarget> {
    ctx.spaces()
        .into_iter()
        .map(|s| PlacementTarget::Space(s.key()))
        .collect()
}

/// 所有可装载目标: 未满托盘按剩余容量降序, 然后空车位
pub(crate) fn all_targets_by_capacity_desc(ctx: &PalletizeContext) -> Vec<PlacementTarget> {
    let mut partial = partial_pallets_best_fit(ctx);
    partial.reverse();
    partial.extend(empty_spaces(ctx));
    partial
}

/// 整条商品（剩余整箱数量）放到第一个可行目标
pub(crate) fn place_whole(
    ops: &DomainOperations,
    ctx: &mut PalletizeContext,
    item: ItemId,
    targets: &[PlacementTarget],
    opts: PlacementOptions,
) -> PalletizeResult<bool> {
    let quantity = ctx.item(item)?.packed_remaining();
    if quantity == 0 {
        return Ok(false);
    }
    for target in targets {
        if ops.can_add(ctx, *target, item, quantity)? {
            ctx.add_product(*target, item, quantity, opts)?;
            return Ok(true);
        }
    }
    Ok(false)
}

/// 依次在目标上放入尽可能多的整箱数量, 返回已放数量
pub(crate) fn fill_greedy(
    ops: &DomainOperations,
    ctx: &mut PalletizeContext,
    item: ItemId,
    targets: &[PlacementTarget],
) -> PalletizeResult<u32> {
    let mut placed = 0;
    for target in targets {
        let remaining = ctx.item(item)?.packed_remaining();
        if remaining == 0 {
            break;
        }
        let quantity = ops.quantity_fitting(ctx, *target, item)?.min(remaining);
        if quantity == 0 {
            continue;
        }
        ctx.add_product(*target, item, quantity, PlacementOptions::default())?;
        placed += quantity;
    }
    Ok(placed)
}
