// ==========================================
// 车辆托盘装载引擎 - 商品目录领域模型
// ==========================================
// 红线: 加载后不可变
// 用途: 包装分组、分层设置、按车位尺寸的装载系数表
// ==========================================

use crate::domain::types::ContainerType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 包装分组 (packing group / subgroup)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackingGroup {
    pub group_code: u32,
    pub sub_group_code: u32,
}

impl PackingGroup {
    pub fn new(group_code: u32, sub_group_code: u32) -> Self {
        Self {
            group_code,
            sub_group_code,
        }
    }
}

/// 托盘分层设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSettings {
    pub quantity_per_layer: u32, // 每层数量
    pub max_layers: u32,         // 单托盘最大层数
}

impl LayerSettings {
    /// 整托数量
    pub fn full_pallet_quantity(&self) -> u32 {
        self.quantity_per_layer.saturating_mul(self.max_layers)
    }
}

/// 装载系数: 在指定尺寸车位上每单位商品占用的容量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingFactor {
    pub space_size: Decimal,
    pub factor: Decimal,
}

// ==========================================
// Product - 商品目录属性
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: u32,
    pub name: String,
    pub packing_group: PackingGroup,
    #[serde(default)]
    pub associable_groups: Vec<u32>,
    #[serde(default)]
    pub layer: Option<LayerSettings>,
    #[serde(default)]
    pub factors: Vec<PackingFactor>,
    #[serde(default)]
    pub container_type: ContainerType,
    #[serde(default)]
    pub is_chopp: bool,
    #[serde(default)]
    pub is_isotonic_water: bool,
    #[serde(default)]
    pub is_marketplace_package: bool,
    #[serde(default)]
    pub is_top_of_pallet: bool,
    #[serde(default)]
    pub is_base_pallet: bool,
    #[serde(default)]
    pub weight_kg: Decimal, // 单位重量
}

impl Product {
    pub fn new(code: u32, name: impl Into<String>, packing_group: PackingGroup) -> Self {
        Self {
            code,
            name: name.into(),
            packing_group,
            associable_groups: Vec::new(),
            layer: None,
            factors: Vec::new(),
            container_type: ContainerType::Disposable,
            is_chopp: false,
            is_isotonic_water: false,
            is_marketplace_package: false,
            is_top_of_pallet: false,
            is_base_pallet: false,
            weight_kg: Decimal::ZERO,
        }
    }

    /// 追加装载系数（构建目录时使用）
    pub fn with_factor(mut self, space_size: Decimal, factor: Decimal) -> Self {
        self.factors.push(PackingFactor { space_size, factor });
        self
    }

    pub fn with_layer(mut self, quantity_per_layer: u32, max_layers: u32) -> Self {
        self.layer = Some(LayerSettings {
            quantity_per_layer,
            max_layers,
        });
        self
    }

    pub fn with_associable_groups(mut self, groups: Vec<u32>) -> Self {
        self.associable_groups = groups;
        self
    }

    /// 查找指定车位尺寸的装载系数
    pub fn factor_for_size(&self, space_size: Decimal) -> Option<Decimal> {
        self.factors
            .iter()
            .find(|f| f.space_size == space_size)
            .map(|f| f.factor)
    }

    pub fn is_returnable(&self) -> bool {
        self.container_type == ContainerType::Returnable
    }

    pub fn is_disposable(&self) -> bool {
        self.container_type == ContainerType::Disposable
    }

    pub fn is_layered(&self) -> bool {
        self.layer.map(|l| l.quantity_per_layer > 0).unwrap_or(false)
    }

    /// 判断本商品能否与指定包装分组共存于同一托盘
    ///
    /// 同组总是允许; 异组需在 associable_groups 中声明
    pub fn can_be_associated(&self, group_code: u32) -> bool {
        self.packing_group.group_code == group_code || self.associable_groups.contains(&group_code)
    }
}

// ==========================================
// ProductCatalog - 商品目录
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<u32, Arc<Product>>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.code, Arc::new(product));
    }

    pub fn get(&self, code: u32) -> Option<Arc<Product>> {
        self.products.get(&code).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for ProductCatalog {
    fn from_iter<T: IntoIterator<Item = Product>>(iter: T) -> Self {
        let mut catalog = ProductCatalog::new();
        for product in iter {
            catalog.insert(product);
        }
        catalog
    }
}
