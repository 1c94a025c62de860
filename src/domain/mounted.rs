// ==========================================
// 车辆托盘装载引擎 - 已装载托盘领域模型
// ==========================================
// 依据: arena + 稳定整数 ID, 快照 = 克隆 ID 表
// 红线: 0 <= occupation <= space.size
// 红线: MountedProduct 只属于一个 Container
// ==========================================

use crate::domain::item::ItemId;
use crate::domain::order::{OrderId, RoutingInfo};
use crate::domain::space::{Space, SpaceKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MountedSpaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MountedProductId(pub u32);

// ==========================================
// MountedSpace - 已分配容器的车位（托盘）
// ==========================================
#[derive(Debug, Clone)]
pub struct MountedSpace {
    pub id: MountedSpaceId,
    pub space: Space,
    pub occupation: Decimal,
    pub order: Option<OrderId>, // 客户专属托盘
    pub containers: Vec<ContainerId>,
}

impl MountedSpace {
    pub fn key(&self) -> SpaceKey {
        self.space.key()
    }

    pub fn size(&self) -> Decimal {
        self.space.size
    }

    pub fn remaining_capacity(&self) -> Decimal {
        (self.space.size - self.occupation).max(Decimal::ZERO)
    }

    /// 占用百分比 (0-100)
    pub fn occupation_percent(&self) -> Decimal {
        if self.space.size <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.occupation * Decimal::ONE_HUNDRED / self.space.size
    }

    pub fn is_full(&self) -> bool {
        self.occupation >= self.space.size
    }

    pub fn first_container(&self) -> Option<ContainerId> {
        self.containers.first().copied()
    }
}

// ==========================================
// Container - 托盘/推车
// ==========================================
#[derive(Debug, Clone)]
pub struct Container {
    pub id: ContainerId,
    pub mounted_space: MountedSpaceId,
    pub products: Vec<MountedProductId>,
}

impl Container {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// ==========================================
// MountedProduct - 已装载商品
// ==========================================
#[derive(Debug, Clone)]
pub struct MountedProduct {
    pub id: MountedProductId,
    pub container: ContainerId,
    pub item: ItemId,
    pub product_code: u32,
    pub amount: u32,
    pub occupation: Decimal,
    pub layer: u32, // 0 表示非整层
    pub assembly_sequence: Option<u32>,
    pub realocated: bool,
    pub splitted: bool,
    pub detached: bool,
    pub routing: Option<RoutingInfo>,
}

impl MountedProduct {
    pub fn is_layer_product(&self) -> bool {
        self.layer > 0
    }
}
