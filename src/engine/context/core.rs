// ==========================================
// 装载上下文 - 核心结构
// ==========================================

use crate::config::{FromSetting, PalletizeSettings};
use crate::domain::item::{Item, ItemId};
use crate::domain::mounted::{
    Container, ContainerId, MountedProduct, MountedProductId, MountedSpace, MountedSpaceId,
};
use crate::domain::order::{Order, OrderId};
use crate::domain::space::Space;
use crate::domain::types::MapKind;
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::factor_converter::FactorConverter;
use std::collections::BTreeMap;

use super::merge::MergeStash;
use super::scope::ScopeFilter;

// ==========================================
// PlacementState - 装载状态 ID 表
// ==========================================
// 快照 = 克隆本结构, 恢复 = 整体替换
#[derive(Debug, Clone, Default)]
pub struct PlacementState {
    pub(crate) available_spaces: Vec<Space>,
    pub(crate) mounted_spaces: BTreeMap<MountedSpaceId, MountedSpace>,
    pub(crate) containers: BTreeMap<ContainerId, Container>,
    pub(crate) products: BTreeMap<MountedProductId, MountedProduct>,
    pub(crate) next_id: u32,
}

impl PlacementState {
    pub(crate) fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

// ==========================================
// PalletizeContext - 装载上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct PalletizeContext {
    pub(crate) kind: MapKind,
    pub(crate) settings: PalletizeSettings,
    pub(crate) items: Vec<Item>,
    pub(crate) orders: Vec<Order>,
    pub(crate) state: PlacementState,
    pub(crate) filters: Vec<ScopeFilter>,
    pub(crate) merge_stash: Option<MergeStash>,
    pub(crate) converter: FactorConverter,
}

impl PalletizeContext {
    /// 创建空上下文
    pub fn new(kind: MapKind, settings: PalletizeSettings) -> Self {
        Self {
            kind,
            settings,
            items: Vec::new(),
            orders: Vec::new(),
            state: PlacementState::default(),
            filters: Vec::new(),
            merge_stash: None,
            converter: FactorConverter::new(),
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn settings(&self) -> &PalletizeSettings {
        &self.settings
    }

    /// 读取装载参数
    pub fn get_setting<T: FromSetting>(&self, key: &str, default: T) -> T {
        self.settings.get_setting(key, default)
    }

    pub fn converter(&self) -> &FactorConverter {
        &self.converter
    }

    pub fn is_merged(&self) -> bool {
        self.merge_stash.is_some()
    }

    // ==========================================
    // 实体访问（不受范围过滤影响）
    // ==========================================

    pub fn item(&self, id: ItemId) -> PalletizeResult<&Item> {
        self.items.get(id.0).ok_or(PalletizeError::ItemNotFound(id))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> PalletizeResult<&mut Item> {
        self.items.get_mut(id.0).ok_or(PalletizeError::ItemNotFound(id))
    }

    pub fn order(&self, id: OrderId) -> PalletizeResult<&Order> {
        self.orders
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| PalletizeError::InvalidState(format!("订单不存在: {:?}", id)))
    }

    pub fn mounted_space(&self, id: MountedSpaceId) -> PalletizeResult<&MountedSpace> {
        self.state
            .mounted_spaces
            .get(&id)
            .ok_or(PalletizeError::MountedSpaceNotFound(id))
    }

    pub(crate) fn mounted_space_mut(&mut self, id: MountedSpaceId) -> PalletizeResult<&mut MountedSpace> {
        self.state
            .mounted_spaces
            .get_mut(&id)
            .ok_or(PalletizeError::MountedSpaceNotFound(id))
    }

    pub fn container(&self, id: ContainerId) -> PalletizeResult<&Container> {
        self.state
            .containers
            .get(&id)
            .ok_or(PalletizeError::ContainerNotFound(id))
    }

    pub fn mounted_product(&self, id: MountedProductId) -> PalletizeResult<&MountedProduct> {
        self.state
            .products
            .get(&id)
            .ok_or(PalletizeError::MountedProductNotFound(id))
    }

    pub(crate) fn mounted_product_mut(
        &mut self,
        id: MountedProductId,
    ) -> PalletizeResult<&mut MountedProduct> {
        self.state
            .products
            .get_mut(&id)
            .ok_or(PalletizeError::MountedProductNotFound(id))
    }

    /// 托盘所属的已装载商品（按容器顺序）
    pub fn products_of(&self, id: MountedSpaceId) -> PalletizeResult<Vec<&MountedProduct>> {
        let ms = self.mounted_space(id)?;
        let mut result = Vec::new();
        for container_id in &ms.containers {
            let container = self.container(*container_id)?;
            for product_id in &container.products {
                result.push(self.mounted_product(*product_id)?);
            }
        }
        Ok(result)
    }

    /// 已装载商品所在托盘
    pub fn mounted_space_of_product(&self, id: MountedProductId) -> PalletizeResult<MountedSpaceId> {
        let mp = self.mounted_product(id)?;
        Ok(self.container(mp.container)?.mounted_space)
    }

    /// 托盘的全部已装载商品（不受范围过滤）
    pub fn all_mounted_spaces(&self) -> Vec<&MountedSpace> {
        let mut list: Vec<&MountedSpace> = self.state.mounted_spaces.values().collect();
        list.sort_by_key(|ms| ms.key());
        list
    }

    /// 所有订单商品（不受范围过滤）
    pub fn all_items(&self) -> Vec<&Item> {
        self.orders
            .iter()
            .flat_map(|o| o.items.iter())
            .filter_map(|id| self.items.get(id.0))
            .collect()
    }
}
