// ==========================================
// 装载上下文 - 构建
// ==========================================
// 用途: 从输入文档或测试代码构建上下文
// 红线: 未知商品代码、非法侧别、重复车位均为输入错误（结构性）
// ==========================================

use crate::config::PalletizeSettings;
use crate::domain::input::PalletizeInput;
use crate::domain::item::{Item, ItemId};
use crate::domain::order::{Order, OrderId};
use crate::domain::product::{Product, ProductCatalog};
use crate::domain::space::Space;
use crate::domain::types::{MapKind, SpaceSide};
use crate::engine::error::{PalletizeError, PalletizeResult};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use super::core::PalletizeContext;

impl PalletizeContext {
    /// 添加空闲车位
    pub fn add_space(&mut self, space: Space) -> PalletizeResult<()> {
        let key = space.key();
        let duplicated = self.state.available_spaces.iter().any(|s| s.key() == key)
            || self.mounted_space_by_key(key).is_some();
        if duplicated {
            return Err(PalletizeError::InvalidInput(format!("车位重复: {}", key)));
        }
        if space.size <= Decimal::ZERO {
            return Err(PalletizeError::InvalidInput(format!(
                "车位尺寸必须为正: {}, size={}",
                key, space.size
            )));
        }
        self.state.available_spaces.push(space);
        Ok(())
    }

    /// 添加订单（编号顺序分配, 从 1 开始）
    pub fn add_order(
        &mut self,
        delivery_order: u32,
        map_number: impl Into<String>,
        customer_code: impl Into<String>,
    ) -> OrderId {
        let id = OrderId(self.orders.iter().map(|o| o.id.0).max().unwrap_or(0) + 1);
        self.orders
            .push(Order::new(id, delivery_order, map_number, customer_code));
        id
    }

    /// 插入已构建的订单（忽略其 items, 商品通过 add_item 添加）
    pub fn insert_order(&mut self, mut order: Order) -> PalletizeResult<OrderId> {
        if self.orders.iter().any(|o| o.id == order.id) {
            return Err(PalletizeError::InvalidInput(format!("订单重复: {:?}", order.id)));
        }
        order.items.clear();
        let id = order.id;
        self.orders.push(order);
        Ok(id)
    }

    /// 向订单添加商品, 配送单与客户分布取订单属性
    pub fn add_item(&mut self, order_id: OrderId, product: Arc<Product>, amount: u32) -> PalletizeResult<ItemId> {
        let order = self.order(order_id)?;
        let (delivery_order, customer) = (order.delivery_order, order.customer_code.clone());
        let id = ItemId(self.items.len());
        let mut item = Item::new(id, order_id, product, amount, delivery_order);
        if amount > 0 {
            item.customer_amounts.insert(customer, amount);
        }
        self.push_item(item)
    }

    /// 添加已配置的商品（id 与订单 id 以上下文为准）
    pub fn push_item(&mut self, mut item: Item) -> PalletizeResult<ItemId> {
        let id = ItemId(self.items.len());
        item.id = id;
        let order_id = item.order_id;
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PalletizeError::InvalidState(format!("订单不存在: {:?}", order_id)))?;
        order.items.push(id);
        self.items.push(item);
        Ok(id)
    }

    /// 从输入文档构建上下文
    ///
    /// # 规则
    /// - 车位取 Spaces[], 为空时取 Vehicle.Bays[]
    /// - 配送顺序缺省为订单序号（从 1 开始）
    /// - 商品数量 = Sales + Detached, Detached 记录为散件
    pub fn from_input(
        input: &PalletizeInput,
        catalog: &ProductCatalog,
        kind: MapKind,
    ) -> PalletizeResult<PalletizeContext> {
        let settings = PalletizeSettings::from_json_map(&input.settings);
        let mut ctx = PalletizeContext::new(kind, settings);

        for bay in input.bays() {
            let side = SpaceSide::parse(&bay.side).ok_or_else(|| {
                PalletizeError::InvalidInput(format!("非法车位侧别: number={}, side={}", bay.number, bay.side))
            })?;
            ctx.add_space(Space::new(bay.number, side, bay.size))?;
        }
        if ctx.state.available_spaces.is_empty() {
            return Err(PalletizeError::InvalidInput("输入不含任何车位".to_string()));
        }

        let vehicle_plate = input.vehicle.as_ref().and_then(|v| v.plate.clone());
        for (index, order_input) in input.orders.iter().enumerate() {
            let delivery_order = order_input.delivery_order.unwrap_or(index as u32 + 1);
            let map_number = order_input
                .cross
                .as_ref()
                .map(|c| c.map_number.clone())
                .unwrap_or_default();
            let customer = order_input
                .client
                .as_ref()
                .map(|c| c.code.clone())
                .unwrap_or_default();
            let order_id = ctx.add_order(delivery_order, map_number, customer);
            if let Some(cross) = &order_input.cross {
                let order = ctx
                    .orders
                    .iter_mut()
                    .find(|o| o.id == order_id)
                    .ok_or_else(|| PalletizeError::InvalidState(format!("订单不存在: {:?}", order_id)))?;
                order.support_point = cross.support_point.clone();
                order.license_plate = cross
                    .vehicle
                    .as_ref()
                    .and_then(|v| v.plate.clone())
                    .or_else(|| vehicle_plate.clone());
            }

            for item_input in &order_input.items {
                let product = catalog.get(item_input.code).ok_or_else(|| {
                    PalletizeError::InvalidInput(format!("商品目录中不存在: code={}", item_input.code))
                })?;
                let amount = item_input.quantity.total();
                let item_id = ctx.add_item(order_id, product, amount)?;
                let detached = item_input.quantity.detached;
                let item = ctx.item_mut(item_id)?;
                if detached > 0 {
                    *item = item.clone().with_detached(detached)?;
                }
                if let Some(extra) = item_input.additional_occupation {
                    item.additional_occupation = extra;
                }
                if let Some(side) = item_input.safe_side {
                    item.safe_side = side;
                }
            }
        }

        info!(
            kind = %kind,
            orders = ctx.orders.len(),
            items = ctx.items.len(),
            spaces = ctx.state.available_spaces.len(),
            "构建装载上下文"
        );
        Ok(ctx)
    }
}
