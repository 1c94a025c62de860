// ==========================================
// 车辆托盘装载引擎 - 订单商品领域模型
// ==========================================
// 红线: amount_remaining 单调不增且 >= 0
// 红线: 各配送单数量合计 == amount（创建时）
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::order::{OrderId, RoutingInfo};
use crate::domain::product::Product;
use crate::domain::types::SafeSide;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 商品在上下文 arena 中的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

/// 合并订单时保留的来源信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSource {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub amount: u32,
    pub routing: RoutingInfo,
}

// ==========================================
// Item - 订单商品
// ==========================================
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub code: u32,
    pub product: Arc<Product>,
    pub order_id: OrderId,
    pub amount: u32,
    amount_remaining: u32,

    // ===== 散件 =====
    pub detached_amount: u32,
    detached_remaining: u32,

    // ===== 分布 =====
    pub delivery_orders: BTreeMap<u32, u32>, // 配送顺序 -> 数量
    pub customer_amounts: BTreeMap<String, u32>,

    /// 每单位附加占用（防超高调整）
    pub additional_occupation: Decimal,
    pub safe_side: SafeSide,

    /// 合并来源（仅合并生成的商品非空）
    pub sources: Vec<ItemSource>,

    non_palletizable: Option<String>,
}

impl Item {
    /// 创建商品, 配送单分布默认全部归属 delivery_order
    pub fn new(
        id: ItemId,
        order_id: OrderId,
        product: Arc<Product>,
        amount: u32,
        delivery_order: u32,
    ) -> Self {
        let mut delivery_orders = BTreeMap::new();
        if amount > 0 {
            delivery_orders.insert(delivery_order, amount);
        }
        Self {
            id,
            code: product.code,
            product,
            order_id,
            amount,
            amount_remaining: amount,
            detached_amount: 0,
            detached_remaining: 0,
            delivery_orders,
            customer_amounts: BTreeMap::new(),
            additional_occupation: Decimal::ZERO,
            safe_side: SafeSide::Indifferent,
            sources: Vec::new(),
            non_palletizable: None,
        }
    }

    /// 指定配送单分布（校验合计）
    pub fn with_delivery_orders(mut self, delivery_orders: BTreeMap<u32, u32>) -> DomainResult<Self> {
        let actual: u32 = delivery_orders.values().sum();
        if actual != self.amount {
            return Err(DomainError::DeliveryOrderMismatch {
                code: self.code,
                expected: self.amount,
                actual,
            });
        }
        self.delivery_orders = delivery_orders;
        Ok(self)
    }

    /// 指定散件数量（属于 amount 的一部分）
    pub fn with_detached(mut self, detached: u32) -> DomainResult<Self> {
        if detached > self.amount {
            return Err(DomainError::DetachedExceedsAmount {
                code: self.code,
                detached,
                amount: self.amount,
            });
        }
        self.detached_amount = detached;
        self.detached_remaining = detached.min(self.amount_remaining);
        Ok(self)
    }

    pub fn amount_remaining(&self) -> u32 {
        self.amount_remaining
    }

    pub fn detached_remaining(&self) -> u32 {
        self.detached_remaining
    }

    /// 剩余整箱数量（不含散件）
    pub fn packed_remaining(&self) -> u32 {
        self.amount_remaining - self.detached_remaining
    }

    pub fn placed_amount(&self) -> u32 {
        self.amount - self.amount_remaining
    }

    /// 扣减剩余数量（整箱优先, 不足时消耗散件）
    pub fn subtract_amount(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity > self.amount_remaining {
            return Err(DomainError::InsufficientAmount {
                code: self.code,
                requested: quantity,
                remaining: self.amount_remaining,
            });
        }
        self.amount_remaining -= quantity;
        self.detached_remaining = self.detached_remaining.min(self.amount_remaining);
        Ok(())
    }

    /// 扣减散件数量
    pub fn subtract_detached(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity > self.detached_remaining {
            return Err(DomainError::InsufficientDetached {
                code: self.code,
                requested: quantity,
                remaining: self.detached_remaining,
            });
        }
        self.detached_remaining -= quantity;
        self.amount_remaining -= quantity;
        Ok(())
    }

    /// 快照回滚 / 拆分回挂时恢复计数
    pub(crate) fn restore_remaining(&mut self, amount_remaining: u32, detached_remaining: u32) {
        self.amount_remaining = amount_remaining.min(self.amount);
        self.detached_remaining = detached_remaining.min(self.amount_remaining);
    }

    pub fn is_chopp(&self) -> bool {
        self.product.is_chopp
    }

    pub fn is_returnable(&self) -> bool {
        self.product.is_returnable()
    }

    pub fn packing_group_code(&self) -> u32 {
        self.product.packing_group.group_code
    }

    // ===== 不可装载标记 =====

    pub fn mark_non_palletizable(&mut self, reason: impl Into<String>) {
        self.non_palletizable = Some(reason.into());
    }

    pub(crate) fn restore_non_palletizable(&mut self, reason: Option<String>) {
        self.non_palletizable = reason;
    }

    pub fn is_non_palletizable(&self) -> bool {
        self.non_palletizable.is_some()
    }

    pub fn non_palletizable_reason(&self) -> Option<&str> {
        self.non_palletizable.as_deref()
    }

    /// 是否仍需装载
    pub fn needs_placement(&self) -> bool {
        self.amount_remaining > 0 && !self.is_non_palletizable()
    }
}
