// ==========================================
// 车辆托盘装载引擎 - 配送订单领域模型
// ==========================================
// 用途: 按配送顺序分组的商品集合 + 路线元数据
// ==========================================

use crate::domain::item::ItemId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 订单标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u32);

/// 路线元数据（地图号 + 配送顺序 + 车牌）
///
/// 合并订单后由 ItemSource 保留, 拆分时据此回挂到原订单
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RoutingInfo {
    pub map_number: String,
    pub delivery_order: u32,
    pub license_plate: Option<String>,
}

// ==========================================
// Order - 配送订单
// ==========================================
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub delivery_order: u32,
    pub map_number: String,
    pub support_point: Option<String>,
    pub license_plate: Option<String>,
    pub customer_code: String,
    pub items: Vec<ItemId>,
    pub pallets_needed: Decimal, // 估算托盘数

    /// 合并生成的虚拟订单
    pub is_merged: bool,
}

impl Order {
    pub fn new(id: OrderId, delivery_order: u32, map_number: impl Into<String>, customer_code: impl Into<String>) -> Self {
        Self {
            id,
            delivery_order,
            map_number: map_number.into(),
            support_point: None,
            license_plate: None,
            customer_code: customer_code.into(),
            items: Vec::new(),
            pallets_needed: Decimal::ZERO,
            is_merged: false,
        }
    }

    pub fn routing(&self) -> RoutingInfo {
        RoutingInfo {
            map_number: self.map_number.clone(),
            delivery_order: self.delivery_order,
            license_plate: self.license_plate.clone(),
        }
    }
}
