// ==========================================
// 订单合并/拆分规则（线路地图）
// ==========================================

use crate::domain::types::MapKind;
use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::info;

/// 装载前把多站订单合并为一个虚拟订单
pub struct MergeOrdersRule {
    base: BaseRule,
}

impl MergeOrdersRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("MergeOrdersRule"),
        }
    }
}

impl Default for MergeOrdersRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MergeOrdersRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.kind() == MapKind::Route && !ctx.is_merged() && ctx.orders().len() > 1
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        ctx.merge_orders_in_place()?;
        Ok(())
    }
}

/// 装载后按来源回挂并恢复原订单
pub struct UnmergeOrdersRule {
    base: BaseRule,
}

impl UnmergeOrdersRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("UnmergeOrdersRule"),
        }
    }
}

impl Default for UnmergeOrdersRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnmergeOrdersRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.is_merged()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        if let Some(report) = ctx.unmerge_orders_in_place()? {
            info!(
                by_routing = report.by_routing,
                single_source = report.single_source,
                exact_quantity = report.exact_quantity,
                first_fit = report.first_fit,
                splitted = report.splitted,
                unresolved = report.unresolved,
                "回挂完成"
            );
        }
        Ok(())
    }
}
