// ==========================================
// 装载上下文 - 变更操作
// ==========================================
// 红线: add_product* 是扣减 amount_remaining 的唯一路径
// 红线: 先校验容量与数量, 校验通过后才修改状态
// 红线: 车位只在空闲池或一个托盘中出现
// ==========================================

use crate::domain::item::ItemId;
use crate::domain::mounted::{
    Container, ContainerId, MountedProduct, MountedProductId, MountedSpace, MountedSpaceId,
};
use crate::domain::order::RoutingInfo;
use crate::domain::space::{Space, SpaceKey};
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::factor_converter::SizeOrFactor;
use rust_decimal::Decimal;
use tracing::debug;

use super::core::PalletizeContext;

/// 装载目标: 车位（可能尚未装载）或已有托盘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTarget {
    Space(SpaceKey),
    MountedSpace(MountedSpaceId),
}

impl From<SpaceKey> for PlacementTarget {
    fn from(key: SpaceKey) -> Self {
        PlacementTarget::Space(key)
    }
}

impl From<MountedSpaceId> for PlacementTarget {
    fn from(id: MountedSpaceId) -> Self {
        PlacementTarget::MountedSpace(id)
    }
}

/// 装载选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOptions {
    /// None 表示读取 OccupationAdjustmentToPreventExcessHeight
    pub apply_height_adjustment: Option<bool>,
    pub layer: u32,
    pub detached: bool,
    pub splitted: bool,
    pub realocated: bool,
}

impl PlacementOptions {
    pub fn layer(layer: u32) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }

    pub fn splitted() -> Self {
        Self {
            splitted: true,
            ..Self::default()
        }
    }
}

/// 解析后的目标车位
pub(crate) struct ResolvedTarget {
    pub space: Space,
    pub occupation: Decimal,
    pub mounted_space: Option<MountedSpaceId>,
}

impl PalletizeContext {
    // ==========================================
    // 目标解析
    // ==========================================

    pub(crate) fn resolve_target(&self, target: PlacementTarget) -> PalletizeResult<ResolvedTarget> {
        match target {
            PlacementTarget::MountedSpace(id) => {
                let ms = self.mounted_space(id)?;
                Ok(ResolvedTarget {
                    space: ms.space.clone(),
                    occupation: ms.occupation,
                    mounted_space: Some(id),
                })
            }
            PlacementTarget::Space(key) => {
                if let Some(ms) = self.mounted_space_by_key(key) {
                    return Ok(ResolvedTarget {
                        space: ms.space.clone(),
                        occupation: ms.occupation,
                        mounted_space: Some(ms.id),
                    });
                }
                let space = self
                    .available_space(key)
                    .ok_or(PalletizeError::SpaceNotAvailable(key))?;
                Ok(ResolvedTarget {
                    space: space.clone(),
                    occupation: Decimal::ZERO,
                    mounted_space: None,
                })
            }
        }
    }

    /// 找到或创建车位对应的托盘（新托盘归属当前订单作用域）
    fn ensure_mounted_space(&mut self, key: SpaceKey) -> PalletizeResult<MountedSpaceId> {
        if let Some(ms) = self.mounted_space_by_key(key) {
            let (id, reused) = (ms.id, self.is_mounted_space_empty(ms));
            // 空托盘被复用时归属改为当前订单作用域
            if reused {
                let owner = self.scoped_order_owner();
                self.mounted_space_mut(id)?.order = owner;
            }
            return Ok(id);
        }
        let position = self
            .state
            .available_spaces
            .iter()
            .position(|s| s.key() == key)
            .ok_or(PalletizeError::SpaceNotAvailable(key))?;
        let space = self.state.available_spaces.remove(position);

        let ms_id = MountedSpaceId(self.state.allocate_id());
        let container_id = ContainerId(self.state.allocate_id());
        self.state.containers.insert(
            container_id,
            Container {
                id: container_id,
                mounted_space: ms_id,
                products: Vec::new(),
            },
        );
        self.state.mounted_spaces.insert(
            ms_id,
            MountedSpace {
                id: ms_id,
                space,
                occupation: Decimal::ZERO,
                order: self.scoped_order_owner(),
                containers: vec![container_id],
            },
        );
        debug!(space = %key, mounted_space = ms_id.0, "创建托盘");
        Ok(ms_id)
    }

    fn first_container_of(&mut self, ms_id: MountedSpaceId) -> PalletizeResult<ContainerId> {
        if let Some(id) = self.mounted_space(ms_id)?.first_container() {
            return Ok(id);
        }
        let container_id = ContainerId(self.state.allocate_id());
        self.state.containers.insert(
            container_id,
            Container {
                id: container_id,
                mounted_space: ms_id,
                products: Vec::new(),
            },
        );
        self.mounted_space_mut(ms_id)?.containers.push(container_id);
        Ok(container_id)
    }

    /// 商品路线元数据（合并订单下为空, 拆分时回挂）
    fn routing_for_item(&self, item: ItemId) -> Option<RoutingInfo> {
        let order_id = self.items.get(item.0)?.order_id;
        let order = self.orders.iter().find(|o| o.id == order_id)?;
        if order.is_merged {
            None
        } else {
            Some(order.routing())
        }
    }

    fn check_capacity(&self, target: &ResolvedTarget, to_add: Decimal) -> PalletizeResult<()> {
        if target.occupation + to_add > target.space.size {
            return Err(PalletizeError::CapacityExceeded {
                space: target.space.key(),
                occupation: target.occupation,
                to_add,
                size: target.space.size,
            });
        }
        Ok(())
    }

    /// 挂载商品到托盘第一个容器（同商品同属性则合并）
    #[allow(clippy::too_many_arguments)]
    fn attach_product(
        &mut self,
        target: &ResolvedTarget,
        item: ItemId,
        product_code: u32,
        amount: u32,
        occupation: Decimal,
        opts: PlacementOptions,
        routing: Option<RoutingInfo>,
    ) -> PalletizeResult<MountedProductId> {
        let ms_id = match target.mounted_space {
            Some(id) => id,
            None => self.ensure_mounted_space(target.space.key())?,
        };
        let container_id = self.first_container_of(ms_id)?;

        let existing = self.container(container_id)?.products.iter().copied().find(|id| {
            self.state.products.get(id).is_some_and(|mp| {
                mp.item == item
                    && mp.layer == opts.layer
                    && mp.detached == opts.detached
                    && mp.routing == routing
            })
        });

        let mp_id = match existing {
            Some(id) => {
                let mp = self.mounted_product_mut(id)?;
                mp.amount += amount;
                mp.occupation += occupation;
                mp.realocated |= opts.realocated;
                mp.splitted |= opts.splitted;
                id
            }
            None => {
                let id = MountedProductId(self.state.allocate_id());
                self.state.products.insert(
                    id,
                    MountedProduct {
                        id,
                        container: container_id,
                        item,
                        product_code,
                        amount,
                        occupation,
                        layer: opts.layer,
                        assembly_sequence: None,
                        realocated: opts.realocated,
                        splitted: opts.splitted,
                        detached: opts.detached,
                        routing,
                    },
                );
                self.state
                    .containers
                    .get_mut(&container_id)
                    .ok_or(PalletizeError::ContainerNotFound(container_id))?
                    .products
                    .push(id);
                id
            }
        };
        self.refresh_occupation(ms_id)?;
        Ok(mp_id)
    }

    /// 托盘占用 = 所有已装载商品占用之和
    pub(crate) fn refresh_occupation(&mut self, ms_id: MountedSpaceId) -> PalletizeResult<Decimal> {
        let total: Decimal = self.products_of(ms_id)?.iter().map(|mp| mp.occupation).sum();
        self.mounted_space_mut(ms_id)?.occupation = total;
        Ok(total)
    }

    // ==========================================
    // 装载（扣减商品剩余数量）
    // ==========================================

    /// 按系数计算占用并装载
    pub fn add_product(
        &mut self,
        target: impl Into<PlacementTarget>,
        item_id: ItemId,
        quantity: u32,
        opts: PlacementOptions,
    ) -> PalletizeResult<MountedProductId> {
        let resolved = self.resolve_target(target.into())?;
        let adjust = opts
            .apply_height_adjustment
            .unwrap_or_else(|| self.apply_height_adjustment());
        let occupation = {
            let item = self.item(item_id)?;
            self.converter
                .occupation(quantity, SizeOrFactor::Size(resolved.space.size), item, adjust)?
        };
        self.place_with_occupation(resolved, item_id, quantity, occupation, opts)
    }

    /// 使用预先计算的占用装载
    pub fn add_complex_load_product(
        &mut self,
        target: impl Into<PlacementTarget>,
        item_id: ItemId,
        quantity: u32,
        occupation: Decimal,
        opts: PlacementOptions,
    ) -> PalletizeResult<MountedProductId> {
        if occupation < Decimal::ZERO {
            return Err(PalletizeError::InvalidState(format!(
                "占用不能为负: item={:?}, occupation={}",
                item_id, occupation
            )));
        }
        let resolved = self.resolve_target(target.into())?;
        self.place_with_occupation(resolved, item_id, quantity, occupation, opts)
    }

    fn place_with_occupation(
        &mut self,
        resolved: ResolvedTarget,
        item_id: ItemId,
        quantity: u32,
        occupation: Decimal,
        opts: PlacementOptions,
    ) -> PalletizeResult<MountedProductId> {
        if quantity == 0 {
            return Err(PalletizeError::InvalidState(format!(
                "装载数量必须大于 0: item={:?}",
                item_id
            )));
        }
        let (code, remaining, detached_remaining) = {
            let item = self.item(item_id)?;
            (item.code, item.amount_remaining(), item.detached_remaining())
        };
        let available = if opts.detached { detached_remaining } else { remaining };
        if quantity > available {
            return Err(crate::domain::error::DomainError::InsufficientAmount {
                code,
                requested: quantity,
                remaining: available,
            }
            .into());
        }
        self.check_capacity(&resolved, occupation)?;

        let routing = self.routing_for_item(item_id);
        let mp_id = self.attach_product(&resolved, item_id, code, quantity, occupation, opts, routing)?;
        let item = self.item_mut(item_id)?;
        if opts.detached {
            item.subtract_detached(quantity)?;
        } else {
            item.subtract_amount(quantity)?;
        }
        debug!(
            space = %resolved.space.key(),
            product_code = code,
            quantity,
            occupation = %occupation,
            "装载商品"
        );
        Ok(mp_id)
    }

    /// 从已有托盘商品复制到目标（不扣减商品, 调用方负责从来源移除）
    pub fn add_product_from_mounted_product(
        &mut self,
        target: impl Into<PlacementTarget>,
        mp_id: MountedProductId,
        quantity: u32,
    ) -> PalletizeResult<MountedProductId> {
        let resolved = self.resolve_target(target.into())?;
        let source = self.mounted_product(mp_id)?.clone();
        if quantity == 0 || quantity > source.amount {
            return Err(PalletizeError::InvalidState(format!(
                "转移数量无效: mounted_product={:?}, quantity={}, amount={}",
                mp_id, quantity, source.amount
            )));
        }
        let occupation = self.occupation_on_size(
            &MountedProduct {
                amount: quantity,
                ..source.clone()
            },
            resolved.space.size,
        )?;
        self.check_capacity(&resolved, occupation)?;

        let opts = PlacementOptions {
            apply_height_adjustment: None,
            layer: source.layer,
            detached: source.detached,
            splitted: source.splitted,
            realocated: true,
        };
        self.attach_product(
            &resolved,
            source.item,
            source.product_code,
            quantity,
            occupation,
            opts,
            source.routing.clone(),
        )
    }

    /// 装载空托盘（占用车位但不放商品）
    pub fn add_mounted_space(&mut self, key: SpaceKey) -> PalletizeResult<MountedSpaceId> {
        self.ensure_mounted_space(key)
    }

    // ==========================================
    // 移除与清理（不恢复商品剩余数量）
    // ==========================================

    /// 从已装载商品中移除部分数量, 占用按比例减少
    pub fn remove_mounted_product_amount(
        &mut self,
        mp_id: MountedProductId,
        quantity: u32,
    ) -> PalletizeResult<()> {
        let ms_id = self.mounted_space_of_product(mp_id)?;
        let mp = self.mounted_product(mp_id)?;
        if quantity > mp.amount {
            return Err(PalletizeError::InvalidState(format!(
                "移除数量超过已装载数量: mounted_product={:?}, quantity={}, amount={}",
                mp_id, quantity, mp.amount
            )));
        }
        let removed = if quantity == mp.amount {
            mp.occupation
        } else {
            mp.occupation * Decimal::from(quantity) / Decimal::from(mp.amount)
        };
        let container_id = mp.container;

        let mp = self.mounted_product_mut(mp_id)?;
        mp.amount -= quantity;
        mp.occupation = (mp.occupation - removed).max(Decimal::ZERO);
        if mp.amount == 0 {
            self.state.products.remove(&mp_id);
            if let Some(container) = self.state.containers.get_mut(&container_id) {
                container.products.retain(|id| *id != mp_id);
            }
        }
        self.refresh_occupation(ms_id)?;
        self.clear_mounted_space_if_empty(ms_id)?;
        Ok(())
    }

    /// 托盘为空时释放, 车位回到空闲池
    pub fn clear_mounted_space_if_empty(&mut self, ms_id: MountedSpaceId) -> PalletizeResult<bool> {
        let ms = self.mounted_space(ms_id)?;
        if !self.is_mounted_space_empty(ms) {
            return Ok(false);
        }
        let Some(ms) = self.state.mounted_spaces.remove(&ms_id) else {
            return Ok(false);
        };
        for container_id in &ms.containers {
            self.state.containers.remove(container_id);
        }
        debug!(space = %ms.key(), mounted_space = ms_id.0, "释放空托盘");
        self.state.available_spaces.push(ms.space);
        Ok(true)
    }

    // ==========================================
    // 交换
    // ==========================================

    /// 交换两个托盘的全部内容（容器与归属订单）, 占用按新尺寸重算
    ///
    /// 任一侧装不下时返回 CapacityExceeded 且不修改状态; 交换后为空的托盘被释放
    pub fn switch_products(&mut self, a: MountedSpaceId, b: MountedSpaceId) -> PalletizeResult<()> {
        if a == b {
            return Ok(());
        }
        let size_a = self.mounted_space(a)?.size();
        let size_b = self.mounted_space(b)?.size();

        // a 的商品去 b, b 的商品去 a
        let mut recomputed: Vec<(MountedProductId, Decimal)> = Vec::new();
        let mut into_b = Decimal::ZERO;
        for mp in self.products_of(a)? {
            let occ = self.occupation_on_size(mp, size_b)?;
            into_b += occ;
            recomputed.push((mp.id, occ));
        }
        let mut into_a = Decimal::ZERO;
        for mp in self.products_of(b)? {
            let occ = self.occupation_on_size(mp, size_a)?;
            into_a += occ;
            recomputed.push((mp.id, occ));
        }
        if into_b > size_b {
            return Err(PalletizeError::CapacityExceeded {
                space: self.mounted_space(b)?.key(),
                occupation: Decimal::ZERO,
                to_add: into_b,
                size: size_b,
            });
        }
        if into_a > size_a {
            return Err(PalletizeError::CapacityExceeded {
                space: self.mounted_space(a)?.key(),
                occupation: Decimal::ZERO,
                to_add: into_a,
                size: size_a,
            });
        }

        for (id, occ) in recomputed {
            self.mounted_product_mut(id)?.occupation = occ;
        }
        let (containers_a, owner_a) = {
            let ms = self.mounted_space(a)?;
            (ms.containers.clone(), ms.order)
        };
        let (containers_b, owner_b) = {
            let ms = self.mounted_space(b)?;
            (ms.containers.clone(), ms.order)
        };
        for cid in &containers_a {
            if let Some(c) = self.state.containers.get_mut(cid) {
                c.mounted_space = b;
            }
        }
        for cid in &containers_b {
            if let Some(c) = self.state.containers.get_mut(cid) {
                c.mounted_space = a;
            }
        }
        {
            let ms = self.mounted_space_mut(a)?;
            ms.containers = containers_b;
            ms.order = owner_b;
        }
        {
            let ms = self.mounted_space_mut(b)?;
            ms.containers = containers_a;
            ms.order = owner_a;
        }
        self.refresh_occupation(a)?;
        self.refresh_occupation(b)?;
        debug!(a = a.0, b = b.0, "交换托盘内容");
        self.clear_mounted_space_if_empty(a)?;
        self.clear_mounted_space_if_empty(b)?;
        Ok(())
    }

    /// 整托移动到另一车位（车位必须空闲）
    pub fn move_mounted_space_to_space(
        &mut self,
        ms_id: MountedSpaceId,
        key: SpaceKey,
    ) -> PalletizeResult<MountedSpaceId> {
        if let Some(existing) = self.mounted_space_by_key(key) {
            if !self.is_mounted_space_empty(existing) {
                return Err(PalletizeError::SpaceNotAvailable(key));
            }
        }
        let target = self.add_mounted_space(key)?;
        if let Err(e) = self.switch_products(ms_id, target) {
            self.clear_mounted_space_if_empty(target)?;
            return Err(e);
        }
        Ok(target)
    }

    // ==========================================
    // 标记与属性
    // ==========================================

    pub fn mark_non_palletizable(&mut self, item: ItemId, reason: impl Into<String>) -> PalletizeResult<()> {
        let reason = reason.into();
        let item = self.item_mut(item)?;
        debug!(product_code = item.code, reason = %reason, "标记不可装载");
        item.mark_non_palletizable(reason);
        Ok(())
    }

    pub fn set_assembly_sequence(&mut self, mp_id: MountedProductId, sequence: u32) -> PalletizeResult<()> {
        self.mounted_product_mut(mp_id)?.assembly_sequence = Some(sequence);
        Ok(())
    }

    /// 估算每个订单所需托盘数: Σ 最大可用尺寸上的占用 / 尺寸
    pub fn compute_pallets_needed(&mut self) -> PalletizeResult<()> {
        let adjust = self.apply_height_adjustment();
        let mut estimates = Vec::with_capacity(self.orders.len());
        for order in &self.orders {
            let mut pallets = Decimal::ZERO;
            for id in &order.items {
                let item = self.item(*id)?;
                if item.amount == 0 {
                    continue;
                }
                let size = self.largest_size_with_factor(item)?;
                let occ = self
                    .converter
                    .occupation(item.amount, SizeOrFactor::Size(size), item, adjust)?;
                pallets += occ / size;
            }
            estimates.push((order.id, pallets.round_dp(2)));
        }
        for (id, pallets) in estimates {
            if let Some(order) = self.orders.iter_mut().find(|o| o.id == id) {
                order.pallets_needed = pallets;
            }
        }
        Ok(())
    }
}
