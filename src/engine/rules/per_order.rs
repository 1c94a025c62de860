// ==========================================
// 分订单子规则链
// ==========================================
// 对每个订单组进入过滤作用域并执行子规则链, 作用域在返回时自动清除
// ByOrder: 每个订单一组（OnlyOrder, 新托盘归属该订单）
// BySupportPoint: 同一支撑点的订单一组（无支撑点时按地图号）
// SharedPallets: 全部订单执行一次, 只可见非专属托盘
// ==========================================

use crate::domain::order::{Order, OrderId};
use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use crate::engine::rule_chain::RuleChain;
use std::collections::BTreeMap;
use tracing::{debug, info_span};

/// 订单分组方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderGrouping {
    ByOrder,
    BySupportPoint,
    SharedPallets,
}

fn support_point_of(order: &Order) -> String {
    order
        .support_point
        .clone()
        .unwrap_or_else(|| order.map_number.clone())
}

pub struct PerOrderRule {
    base: BaseRule,
    grouping: OrderGrouping,
    sub_chain: RuleChain,
}

impl PerOrderRule {
    pub fn new(grouping: OrderGrouping, sub_chain: RuleChain) -> Self {
        Self {
            base: BaseRule::new("PerOrderRule"),
            grouping,
            sub_chain,
        }
    }

    pub fn grouping(&self) -> OrderGrouping {
        self.grouping
    }

    pub fn sub_chain(&self) -> &RuleChain {
        &self.sub_chain
    }

    fn run_for_order(&self, ctx: &mut PalletizeContext, id: OrderId) -> PalletizeResult<()> {
        let _span = info_span!("per_order", order = id.0).entered();
        let mut scoped = ctx.with_only_order(id);
        let report = self.sub_chain.execute_chain(&mut scoped)?;
        debug!(order = id.0, executed = report.executed_count(), "订单子链完成");
        Ok(())
    }

    fn run_for_support_point(&self, ctx: &mut PalletizeContext, point: String) -> PalletizeResult<()> {
        let _span = info_span!("per_support_point", support_point = %point).entered();
        let key = point.clone();
        let mut scoped = ctx.with_order_filter(move |o| support_point_of(o) == key);
        let report = self.sub_chain.execute_chain(&mut scoped)?;
        debug!(support_point = %point, executed = report.executed_count(), "支撑点子链完成");
        Ok(())
    }

    fn run_shared(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let mut scoped = ctx.with_mounted_space_filter(|ms| ms.order.is_none());
        let report = self.sub_chain.execute_chain(&mut scoped)?;
        debug!(executed = report.executed_count(), "共享托盘子链完成");
        Ok(())
    }
}

impl Rule for PerOrderRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !self.sub_chain.is_empty() && !ctx.orders().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        match self.grouping {
            OrderGrouping::ByOrder => {
                let ids: Vec<OrderId> = ctx.orders().iter().map(|o| o.id).collect();
                for id in ids {
                    self.run_for_order(ctx, id)?;
                }
            }
            OrderGrouping::BySupportPoint => {
                // 按首个订单的配送顺序排列各组
                let mut points: BTreeMap<String, u32> = BTreeMap::new();
                for order in ctx.orders() {
                    let entry = points.entry(support_point_of(order)).or_insert(order.delivery_order);
                    *entry = (*entry).min(order.delivery_order);
                }
                let mut ordered: Vec<(String, u32)> = points.into_iter().collect();
                ordered.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
                for (point, _) in ordered {
                    self.run_for_support_point(ctx, point)?;
                }
            }
            OrderGrouping::SharedPallets => self.run_shared(ctx)?,
        }
        Ok(())
    }
}
