// ==========================================
// 车辆托盘装载引擎 - 输入文档 DTO
// ==========================================
// 用途: 装载请求 JSON 的强类型映射（文件读取/HTTP 不在本库范围内）
// 命名: PascalCase（与外部文档一致）
// ==========================================

use crate::domain::types::SafeSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PalletizeInput {
    pub orders: Vec<OrderInput>,
    #[serde(default)]
    pub spaces: Vec<SpaceInput>,
    #[serde(default)]
    pub vehicle: Option<VehicleInput>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl PalletizeInput {
    /// 车位来源: Spaces[] 优先, 否则 Vehicle.Bays[]
    pub fn bays(&self) -> &[SpaceInput] {
        if !self.spaces.is_empty() {
            return &self.spaces;
        }
        self.vehicle.as_ref().map(|v| v.bays.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderInput {
    #[serde(default)]
    pub delivery_order: Option<u32>,
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub cross: Option<CrossInput>,
    #[serde(default)]
    pub client: Option<ClientInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemInput {
    pub code: u32,
    pub quantity: QuantityInput,
    #[serde(default)]
    pub additional_occupation: Option<Decimal>,
    #[serde(default)]
    pub safe_side: Option<SafeSide>,
}

/// 数量: Sales = 整箱数, Detached = 散件数, Unit = 每箱单位数（仅信息）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct QuantityInput {
    #[serde(default)]
    pub sales: u32,
    #[serde(default)]
    pub unit: u32,
    #[serde(default)]
    pub detached: u32,
}

impl QuantityInput {
    pub fn total(&self) -> u32 {
        self.sales.saturating_add(self.detached)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrossInput {
    pub map_number: String,
    #[serde(default)]
    pub support_point: Option<String>,
    #[serde(default)]
    pub vehicle: Option<PlateInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlateInput {
    #[serde(default)]
    pub plate: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientInput {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleInput {
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub bays: Vec<SpaceInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpaceInput {
    pub number: u32,
    pub side: String,
    pub size: Decimal,
}
