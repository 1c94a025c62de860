// ==========================================
// 装载上下文 - 查询视图
// ==========================================
// 规则通过这些视图读取状态, 不直接访问底层集合
// 所有视图均应用当前范围过滤
// ==========================================

use crate::domain::item::{Item, ItemId};
use crate::domain::mounted::{MountedProduct, MountedSpace, MountedSpaceId};
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::domain::space::{sort_spaces, Space, SpaceKey};
use crate::domain::types::{ContainerType, SafeSide};
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::factor_converter::SizeOrFactor;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use super::core::PalletizeContext;

impl PalletizeContext {
    // ==========================================
    // 订单与商品
    // ==========================================

    /// 范围内订单（按配送顺序）
    pub fn orders(&self) -> Vec<&Order> {
        let mut list: Vec<&Order> = self.orders.iter().filter(|o| self.order_in_scope(o)).collect();
        list.sort_by_key(|o| (o.delivery_order, o.id));
        list
    }

    /// 范围内全部商品
    pub fn items(&self) -> Vec<&Item> {
        self.orders()
            .into_iter()
            .flat_map(|o| o.items.iter())
            .filter_map(|id| self.items.get(id.0))
            .collect()
    }

    /// 范围内仍需装载的商品
    pub fn items_with_remaining(&self) -> Vec<&Item> {
        self.items().into_iter().filter(|i| i.needs_placement()).collect()
    }

    pub fn item_ids_with_remaining(&self) -> Vec<ItemId> {
        self.items_with_remaining().iter().map(|i| i.id).collect()
    }

    /// 剩余整箱数量 > 0 的商品
    pub fn item_ids_with_packed_remaining(&self) -> Vec<ItemId> {
        self.items_with_remaining()
            .iter()
            .filter(|i| i.packed_remaining() > 0)
            .map(|i| i.id)
            .collect()
    }

    /// 已标记为不可装载且仍有剩余的商品
    pub fn non_palletized_items(&self) -> Vec<&Item> {
        self.all_items()
            .into_iter()
            .filter(|i| i.amount_remaining() > 0)
            .collect()
    }

    // ==========================================
    // 车位与托盘
    // ==========================================

    /// 可用车位 = 空闲车位 ∪ 空托盘的车位
    ///
    /// 排序: 车位号升序, 同号司机侧在前
    pub fn spaces(&self) -> Vec<Space> {
        let mut list: Vec<Space> = self
            .state
            .available_spaces
            .iter()
            .filter(|s| self.space_in_scope(s))
            .cloned()
            .collect();
        for ms in self.state.mounted_spaces.values() {
            if self.is_mounted_space_empty(ms) && self.space_in_scope(&ms.space) {
                list.push(ms.space.clone());
            }
        }
        sort_spaces(&mut list);
        list
    }

    /// 无占用车位（与 spaces 同义, 供规则语义化调用）
    pub fn spaces_without_occupation(&self) -> Vec<Space> {
        self.spaces()
    }

    /// 范围内托盘（按车位排序）
    pub fn mounted_spaces(&self) -> Vec<&MountedSpace> {
        let mut list: Vec<&MountedSpace> = self
            .state
            .mounted_spaces
            .values()
            .filter(|ms| self.mounted_space_in_scope(ms))
            .collect();
        list.sort_by_key(|ms| ms.key());
        list
    }

    pub fn mounted_space_ids(&self) -> Vec<MountedSpaceId> {
        self.mounted_spaces().iter().map(|ms| ms.id).collect()
    }

    /// 有占用的托盘
    pub fn mounted_spaces_with_occupation(&self) -> Vec<&MountedSpace> {
        self.mounted_spaces()
            .into_iter()
            .filter(|ms| ms.occupation > Decimal::ZERO)
            .collect()
    }

    pub fn mounted_space_by_key(&self, key: SpaceKey) -> Option<&MountedSpace> {
        self.state.mounted_spaces.values().find(|ms| ms.key() == key)
    }

    /// 空闲池中的车位
    pub fn available_space(&self, key: SpaceKey) -> Option<&Space> {
        self.state.available_spaces.iter().find(|s| s.key() == key)
    }

    /// 车位总数（空闲 + 已装载）
    pub fn bay_count(&self) -> usize {
        self.state.available_spaces.len() + self.state.mounted_spaces.len()
    }

    /// 全部车位尺寸（去重）
    pub fn space_sizes(&self) -> BTreeSet<Decimal> {
        self.state
            .available_spaces
            .iter()
            .map(|s| s.size)
            .chain(self.state.mounted_spaces.values().map(|ms| ms.size()))
            .collect()
    }

    pub(crate) fn is_mounted_space_empty(&self, ms: &MountedSpace) -> bool {
        ms.containers.iter().all(|cid| {
            self.state
                .containers
                .get(cid)
                .map(|c| c.is_empty())
                .unwrap_or(true)
        })
    }

    // ==========================================
    // 托盘派生属性
    // ==========================================

    /// 托盘上的商品目录属性
    pub fn products_catalog_of(&self, id: MountedSpaceId) -> PalletizeResult<Vec<&Product>> {
        let mut result = Vec::new();
        for mp in self.products_of(id)? {
            result.push(self.item(mp.item)?.product.as_ref());
        }
        Ok(result)
    }

    /// 托盘上的包装分组代码
    pub fn packing_groups_of(&self, id: MountedSpaceId) -> PalletizeResult<BTreeSet<u32>> {
        Ok(self
            .products_catalog_of(id)?
            .into_iter()
            .map(|p| p.packing_group.group_code)
            .collect())
    }

    pub fn has_chopp(&self, id: MountedSpaceId) -> PalletizeResult<bool> {
        Ok(self.products_catalog_of(id)?.iter().any(|p| p.is_chopp))
    }

    pub fn container_types_of(&self, id: MountedSpaceId) -> PalletizeResult<BTreeSet<ContainerTypeKey>> {
        Ok(self
            .products_catalog_of(id)?
            .iter()
            .map(|p| ContainerTypeKey::from(p.container_type))
            .collect())
    }

    /// 某商品在所有托盘上的已装载数量
    pub fn placed_amount_of(&self, item: ItemId) -> u32 {
        self.state
            .products
            .values()
            .filter(|mp| mp.item == item)
            .map(|mp| mp.amount)
            .sum()
    }

    pub fn mounted_products_of_item(&self, item: ItemId) -> Vec<&MountedProduct> {
        self.state.products.values().filter(|mp| mp.item == item).collect()
    }

    /// 重新计算某托盘商品在另一尺寸车位上的占用
    pub fn occupation_on_size(&self, mp: &MountedProduct, size: Decimal) -> PalletizeResult<Decimal> {
        let item = self.item(mp.item)?;
        self.converter
            .occupation(mp.amount, SizeOrFactor::Size(size), item, self.apply_height_adjustment())
    }

    /// 是否应用防超高附加占用
    pub fn apply_height_adjustment(&self) -> bool {
        self.get_setting(
            crate::config::config_keys::OCCUPATION_ADJUSTMENT_TO_PREVENT_EXCESS_HEIGHT,
            false,
        )
    }

    // ==========================================
    // 安全侧
    // ==========================================

    /// 配送单的安全侧: 按数量加权的多数侧, 平局或无要求为 Indifferent
    pub fn delivery_safe_side(&self, delivery_order: u32) -> SafeSide {
        let mut driver = 0u64;
        let mut helper = 0u64;
        for item in self.all_items() {
            let amount = item.delivery_orders.get(&delivery_order).copied().unwrap_or(0) as u64;
            match item.safe_side {
                SafeSide::Driver => driver += amount,
                SafeSide::Helper => helper += amount,
                SafeSide::Indifferent => {}
            }
        }
        match driver.cmp(&helper) {
            std::cmp::Ordering::Greater => SafeSide::Driver,
            std::cmp::Ordering::Less => SafeSide::Helper,
            std::cmp::Ordering::Equal => SafeSide::Indifferent,
        }
    }

    /// 托盘的安全侧: 按占用加权的各商品配送单安全侧
    pub fn mounted_space_safe_side(&self, id: MountedSpaceId) -> PalletizeResult<SafeSide> {
        let mut weights: BTreeMap<&'static str, Decimal> = BTreeMap::new();
        for mp in self.products_of(id)? {
            let delivery_order = match &mp.routing {
                Some(r) => r.delivery_order,
                None => {
                    let item = self.item(mp.item)?;
                    match item.delivery_orders.iter().max_by_key(|(_, q)| **q) {
                        Some((d, _)) => *d,
                        None => continue,
                    }
                }
            };
            let key = match self.delivery_safe_side(delivery_order) {
                SafeSide::Driver => "D",
                SafeSide::Helper => "H",
                SafeSide::Indifferent => continue,
            };
            *weights.entry(key).or_insert(Decimal::ZERO) += mp.occupation;
        }
        let driver = weights.get("D").copied().unwrap_or(Decimal::ZERO);
        let helper = weights.get("H").copied().unwrap_or(Decimal::ZERO);
        Ok(match driver.cmp(&helper) {
            std::cmp::Ordering::Greater => SafeSide::Driver,
            std::cmp::Ordering::Less => SafeSide::Helper,
            std::cmp::Ordering::Equal => SafeSide::Indifferent,
        })
    }

    // ==========================================
    // 汇总
    // ==========================================

    pub fn total_occupation(&self) -> Decimal {
        self.state.mounted_spaces.values().map(|ms| ms.occupation).sum()
    }

    /// 最大车位尺寸中商品有系数的那个
    pub(crate) fn largest_size_with_factor(&self, item: &Item) -> PalletizeResult<Decimal> {
        self.space_sizes()
            .into_iter()
            .rev()
            .find(|size| item.product.factor_for_size(*size).is_some())
            .ok_or_else(|| PalletizeError::MissingFactor {
                product_code: item.code,
                space_size: self.space_sizes().into_iter().next_back().unwrap_or(Decimal::ZERO),
            })
    }
}

/// 包装类型集合键（可排序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContainerTypeKey {
    Returnable,
    Disposable,
}

impl From<ContainerType> for ContainerTypeKey {
    fn from(t: ContainerType) -> Self {
        match t {
            ContainerType::Returnable => ContainerTypeKey::Returnable,
            ContainerType::Disposable => ContainerTypeKey::Disposable,
        }
    }
}
