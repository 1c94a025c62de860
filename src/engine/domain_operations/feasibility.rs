// ==========================================
// 领域操作 - 可行性判断 (CanAdd)
// ==========================================
// 容量规则: occupation + to_add <= size（恰好装满允许）
// 装载规则（按参数开启）:
// - ShouldLimitPackageGroups: 包装分组数 <= MaxPackageGroups, 新分组须与已有分组全部可关联
// - ChoppExclusivePallet: 生啤只与生啤同托
// - SeparateReturnableFromDisposable: 可回收与一次性包装不同托
// ==========================================

use crate::config::{config_keys, defaults, PalletizeSettings};
use crate::domain::item::ItemId;
use crate::domain::mounted::MountedSpaceId;
use crate::domain::product::Product;
use crate::domain::space::SpaceKey;
use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::error::PalletizeResult;
use crate::engine::factor_converter::SizeOrFactor;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

use super::core::DomainOperations;

impl DomainOperations {
    /// 待装载数量在指定尺寸上的占用
    pub fn occupation_to_add(
        &self,
        ctx: &PalletizeContext,
        size: Decimal,
        item: ItemId,
        quantity: u32,
    ) -> PalletizeResult<Decimal> {
        let item = ctx.item(item)?;
        self.converter.occupation(
            quantity,
            SizeOrFactor::Size(size),
            item,
            ctx.apply_height_adjustment(),
        )
    }

    // ==========================================
    // 装载规则
    // ==========================================

    /// 托盘的装载规则检查（不含容量）
    pub fn can_add_basic(
        &self,
        ctx: &PalletizeContext,
        ms: MountedSpaceId,
        product: &Product,
    ) -> PalletizeResult<bool> {
        let existing = ctx.products_catalog_of(ms)?;
        Ok(basic_compatible(ctx.settings(), &existing, product))
    }

    // ==========================================
    // 单个商品 -> 车位/托盘
    // ==========================================

    pub fn can_add_to_mounted_space(
        &self,
        ctx: &PalletizeContext,
        ms: MountedSpaceId,
        item: ItemId,
        quantity: u32,
    ) -> PalletizeResult<bool> {
        let mounted = ctx.mounted_space(ms)?;
        let to_add = self.occupation_to_add(ctx, mounted.size(), item, quantity)?;
        if mounted.occupation + to_add > mounted.size() {
            return Ok(false);
        }
        self.can_add_basic(ctx, ms, &ctx.item(item)?.product)
    }

    /// 车位已装载时按托盘判断; 车位不可用时返回 false
    pub fn can_add_to_space(
        &self,
        ctx: &PalletizeContext,
        key: SpaceKey,
        item: ItemId,
        quantity: u32,
    ) -> PalletizeResult<bool> {
        if let Some(ms) = ctx.mounted_space_by_key(key) {
            return self.can_add_to_mounted_space(ctx, ms.id, item, quantity);
        }
        let Some(space) = ctx.available_space(key) else {
            return Ok(false);
        };
        let to_add = self.occupation_to_add(ctx, space.size, item, quantity)?;
        Ok(to_add <= space.size)
    }

    pub fn can_add(
        &self,
        ctx: &PalletizeContext,
        target: PlacementTarget,
        item: ItemId,
        quantity: u32,
    ) -> PalletizeResult<bool> {
        match target {
            PlacementTarget::Space(key) => self.can_add_to_space(ctx, key, item, quantity),
            PlacementTarget::MountedSpace(ms) => self.can_add_to_mounted_space(ctx, ms, item, quantity),
        }
    }

    // ==========================================
    // 整托 -> 托盘/车位
    // ==========================================

    /// from 的全部商品能否并入 to（占用按 to 的尺寸重算）
    pub fn can_add_mounted_space_to_mounted_space(
        &self,
        ctx: &PalletizeContext,
        from: MountedSpaceId,
        to: MountedSpaceId,
    ) -> PalletizeResult<bool> {
        if from == to {
            return Ok(false);
        }
        let target = ctx.mounted_space(to)?;
        let incoming = self.recomputed_occupation(ctx, from, target.size())?;
        if target.occupation + incoming > target.size() {
            return Ok(false);
        }
        let mut existing = ctx.products_catalog_of(to)?;
        for product in ctx.products_catalog_of(from)? {
            if !basic_compatible(ctx.settings(), &existing, product) {
                return Ok(false);
            }
            existing.push(product);
        }
        Ok(true)
    }

    /// from 的全部商品能否放到车位 key（车位空闲或为空托盘）
    pub fn can_add_mounted_space_to_space(
        &self,
        ctx: &PalletizeContext,
        from: MountedSpaceId,
        key: SpaceKey,
    ) -> PalletizeResult<bool> {
        if let Some(ms) = ctx.mounted_space_by_key(key) {
            if ms.id == from {
                return Ok(false);
            }
            return self.can_add_mounted_space_to_mounted_space(ctx, from, ms.id);
        }
        let Some(space) = ctx.available_space(key) else {
            return Ok(false);
        };
        let incoming = self.recomputed_occupation(ctx, from, space.size)?;
        Ok(incoming <= space.size)
    }

    /// 托盘全部商品在另一尺寸上的占用之和
    pub fn recomputed_occupation(
        &self,
        ctx: &PalletizeContext,
        ms: MountedSpaceId,
        size: Decimal,
    ) -> PalletizeResult<Decimal> {
        let mut total = Decimal::ZERO;
        for mp in ctx.products_of(ms)? {
            total += ctx.occupation_on_size(mp, size)?;
        }
        Ok(total)
    }
}

/// 在已有商品集合上追加 product 是否满足装载规则
pub(crate) fn basic_compatible(settings: &PalletizeSettings, existing: &[&Product], product: &Product) -> bool {
    if existing.is_empty() {
        return true;
    }

    if settings.get_setting(config_keys::SHOULD_LIMIT_PACKAGE_GROUPS, false) {
        let groups: BTreeSet<u32> = existing.iter().map(|p| p.packing_group.group_code).collect();
        let group = product.packing_group.group_code;
        if !groups.contains(&group) {
            let max_groups: usize = settings.get_setting(
                config_keys::MAX_PACKAGE_GROUPS,
                defaults::MAX_PACKAGE_GROUPS as usize,
            );
            if groups.len() >= max_groups {
                return false;
            }
            if !groups.iter().all(|g| product.can_be_associated(*g)) {
                return false;
            }
        }
    }

    if settings.get_setting(config_keys::CHOPP_EXCLUSIVE_PALLET, false)
        && existing.iter().any(|p| p.is_chopp != product.is_chopp)
    {
        return false;
    }

    if settings.get_setting(config_keys::SEPARATE_RETURNABLE_FROM_DISPOSABLE, false)
        && existing.iter().any(|p| p.container_type != product.container_type)
    {
        return false;
    }

    true
}
