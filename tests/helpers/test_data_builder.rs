// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use pallet_mounting::config::PalletizeSettings;
use pallet_mounting::domain::item::{Item, ItemId};
use pallet_mounting::domain::order::OrderId;
use pallet_mounting::domain::product::{PackingGroup, Product};
use pallet_mounting::domain::space::Space;
use pallet_mounting::domain::types::{ContainerType, MapKind, SafeSide, SpaceSide};
use pallet_mounting::engine::PalletizeContext;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

// ==========================================
// Product 构建器
// ==========================================

pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    /// 默认: 尺寸 10 上系数 1.0, 尺寸 8 上系数 1.25
    pub fn new(code: u32) -> Self {
        Self {
            product: Product::new(code, format!("P{}", code), PackingGroup::new(1, 1))
                .with_factor(dec(10), Decimal::ONE)
                .with_factor(dec(8), Decimal::new(125, 2)),
        }
    }

    pub fn group(mut self, group: u32, sub_group: u32) -> Self {
        self.product.packing_group = PackingGroup::new(group, sub_group);
        self
    }

    pub fn factor(mut self, size: i64, factor: Decimal) -> Self {
        self.product.factors.retain(|f| f.space_size != dec(size));
        self.product = self.product.with_factor(dec(size), factor);
        self
    }

    pub fn without_factors(mut self) -> Self {
        self.product.factors.clear();
        self
    }

    pub fn layer(mut self, quantity_per_layer: u32, max_layers: u32) -> Self {
        self.product = self.product.with_layer(quantity_per_layer, max_layers);
        self
    }

    pub fn chopp(mut self) -> Self {
        self.product.is_chopp = true;
        self
    }

    pub fn returnable(mut self) -> Self {
        self.product.container_type = ContainerType::Returnable;
        self
    }

    pub fn weight(mut self, kg: i64) -> Self {
        self.product.weight_kg = dec(kg);
        self
    }

    pub fn build(self) -> Product {
        self.product
    }

    pub fn arc(self) -> Arc<Product> {
        Arc::new(self.product)
    }
}

// ==========================================
// Context 构建器
// ==========================================

pub struct ContextBuilder {
    ctx: PalletizeContext,
}

impl ContextBuilder {
    pub fn new(kind: MapKind) -> Self {
        Self {
            ctx: PalletizeContext::new(kind, PalletizeSettings::new()),
        }
    }

    pub fn with_settings(kind: MapKind, settings: PalletizeSettings) -> Self {
        Self {
            ctx: PalletizeContext::new(kind, settings),
        }
    }

    /// 司机侧车位, 编号从 1 开始
    pub fn spaces(mut self, sizes: &[i64]) -> Self {
        for (index, size) in sizes.iter().enumerate() {
            self.ctx
                .add_space(Space::new(index as u32 + 1, SpaceSide::Driver, dec(*size)))
                .unwrap();
        }
        self
    }

    /// 每个车位号两侧都有车位
    pub fn bays(mut self, count: u32, size: i64) -> Self {
        for number in 1..=count {
            for side in [SpaceSide::Driver, SpaceSide::Helper] {
                self.ctx.add_space(Space::new(number, side, dec(size))).unwrap();
            }
        }
        self
    }

    pub fn order(&mut self, delivery_order: u32, map_number: &str, customer: &str) -> OrderId {
        self.ctx.add_order(delivery_order, map_number, customer)
    }

    pub fn item(&mut self, order: OrderId, product: Product, amount: u32) -> ItemId {
        self.ctx.add_item(order, Arc::new(product), amount).unwrap()
    }

    /// 带安全侧与配送单分布的商品
    pub fn routed_item(
        &mut self,
        order: OrderId,
        product: Product,
        delivery_orders: &[(u32, u32)],
        safe_side: SafeSide,
    ) -> ItemId {
        let amount = delivery_orders.iter().map(|(_, q)| *q).sum();
        let map: BTreeMap<u32, u32> = delivery_orders.iter().copied().collect();
        let mut item = Item::new(ItemId(0), order, Arc::new(product), amount, 1)
            .with_delivery_orders(map)
            .unwrap();
        item.safe_side = safe_side;
        self.ctx.push_item(item).unwrap()
    }

    pub fn detached_item(&mut self, order: OrderId, product: Product, amount: u32, detached: u32) -> ItemId {
        let item = Item::new(ItemId(0), order, Arc::new(product), amount, 1)
            .with_detached(detached)
            .unwrap();
        self.ctx.push_item(item).unwrap()
    }

    pub fn context(&mut self) -> &mut PalletizeContext {
        &mut self.ctx
    }

    pub fn build(self) -> PalletizeContext {
        self.ctx
    }
}
