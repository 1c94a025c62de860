// ==========================================
// 领域操作 - 托盘商品移动
// ==========================================
// 流程: 解析目标 -> 容量检查 -> 装载规则检查 -> 复制到目标 -> 从来源移除
// 来源托盘变空时由上下文释放, 车位回到空闲池
// ==========================================

use crate::domain::mounted::{MountedProduct, MountedProductId, MountedSpaceId};
use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::error::{PalletizeError, PalletizeResult};
use rust_decimal::Decimal;
use tracing::debug;

use super::core::{DomainOperations, MoveOutcome, MoveRejection};
use super::feasibility::basic_compatible;

impl DomainOperations {
    /// 移动一个已装载商品的部分或全部数量
    pub fn move_mounted_product(
        &self,
        ctx: &mut PalletizeContext,
        mp_id: MountedProductId,
        quantity: u32,
        target: PlacementTarget,
    ) -> PalletizeResult<MoveOutcome> {
        let origin = ctx.mounted_space_of_product(mp_id)?;
        let source = ctx.mounted_product(mp_id)?.clone();
        if quantity == 0 {
            return Ok(MoveOutcome::Rejected(MoveRejection::NothingToMove));
        }
        if quantity > source.amount {
            return Err(PalletizeError::InvalidState(format!(
                "移动数量超过已装载数量: mounted_product={:?}, quantity={}, amount={}",
                mp_id, quantity, source.amount
            )));
        }

        let Ok(resolved) = ctx.resolve_target(target) else {
            return Ok(MoveOutcome::Rejected(MoveRejection::TargetUnavailable));
        };
        if resolved.mounted_space == Some(origin) {
            return Ok(MoveOutcome::Rejected(MoveRejection::SameSpace));
        }

        let to_add = ctx.occupation_on_size(
            &MountedProduct {
                amount: quantity,
                ..source.clone()
            },
            resolved.space.size,
        )?;
        if resolved.occupation + to_add > resolved.space.size {
            return Ok(MoveOutcome::Rejected(MoveRejection::Capacity));
        }
        if let Some(target_ms) = resolved.mounted_space {
            let product = ctx.item(source.item)?.product.clone();
            if !self.can_add_basic(ctx, target_ms, &product)? {
                return Ok(MoveOutcome::Rejected(MoveRejection::PackingRules));
            }
        }

        let moved = ctx.add_product_from_mounted_product(target, mp_id, quantity)?;
        ctx.remove_mounted_product_amount(mp_id, quantity)?;
        let target_ms = ctx.mounted_space_of_product(moved)?;
        debug!(
            product_code = source.product_code,
            quantity,
            from = origin.0,
            to = target_ms.0,
            "移动已装载商品"
        );
        Ok(MoveOutcome::Moved {
            target: target_ms,
            products: vec![moved],
            quantity,
        })
    }

    /// 整体移动同一托盘上的多个已装载商品
    pub fn move_mounted_products(
        &self,
        ctx: &mut PalletizeContext,
        from: MountedSpaceId,
        ids: &[MountedProductId],
        target: PlacementTarget,
    ) -> PalletizeResult<MoveOutcome> {
        if ids.is_empty() {
            return Ok(MoveOutcome::Rejected(MoveRejection::NothingToMove));
        }
        let mut sources = Vec::with_capacity(ids.len());
        for id in ids {
            if ctx.mounted_space_of_product(*id)? != from {
                return Err(PalletizeError::InvalidState(format!(
                    "已装载商品不在来源托盘上: mounted_product={:?}, from={:?}",
                    id, from
                )));
            }
            sources.push(ctx.mounted_product(*id)?.clone());
        }

        let Ok(resolved) = ctx.resolve_target(target) else {
            return Ok(MoveOutcome::Rejected(MoveRejection::TargetUnavailable));
        };
        if resolved.mounted_space == Some(from) {
            return Ok(MoveOutcome::Rejected(MoveRejection::SameSpace));
        }

        let mut to_add = Decimal::ZERO;
        for mp in &sources {
            to_add += ctx.occupation_on_size(mp, resolved.space.size)?;
        }
        if resolved.occupation + to_add > resolved.space.size {
            return Ok(MoveOutcome::Rejected(MoveRejection::Capacity));
        }

        let mut existing = match resolved.mounted_space {
            Some(ms) => ctx.products_catalog_of(ms)?,
            None => Vec::new(),
        };
        for mp in &sources {
            let product = ctx.item(mp.item)?.product.as_ref();
            if !basic_compatible(ctx.settings(), &existing, product) {
                return Ok(MoveOutcome::Rejected(MoveRejection::PackingRules));
            }
            existing.push(product);
        }
        drop(existing);

        let mut moved = Vec::with_capacity(sources.len());
        let mut quantity = 0;
        for mp in &sources {
            moved.push(ctx.add_product_from_mounted_product(target, mp.id, mp.amount)?);
            ctx.remove_mounted_product_amount(mp.id, mp.amount)?;
            quantity += mp.amount;
        }
        let target_ms = match moved.first() {
            Some(id) => ctx.mounted_space_of_product(*id)?,
            None => return Ok(MoveOutcome::Rejected(MoveRejection::NothingToMove)),
        };
        debug!(from = from.0, to = target_ms.0, products = moved.len(), "整体移动已装载商品");
        Ok(MoveOutcome::Moved {
            target: target_ms,
            products: moved,
            quantity,
        })
    }

    /// 移动托盘上全部商品
    pub fn move_all_products(
        &self,
        ctx: &mut PalletizeContext,
        from: MountedSpaceId,
        target: PlacementTarget,
    ) -> PalletizeResult<MoveOutcome> {
        let ids: Vec<MountedProductId> = ctx.products_of(from)?.iter().map(|mp| mp.id).collect();
        self.move_mounted_products(ctx, from, &ids, target)
    }
}
