use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::debug;

/// 估算每个订单所需托盘数
pub struct ComputePalletsNeededRule {
    base: BaseRule,
}

impl ComputePalletsNeededRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("ComputePalletsNeededRule"),
        }
    }
}

impl Default for ComputePalletsNeededRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ComputePalletsNeededRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !ctx.orders().is_empty() && !ctx.space_sizes().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        ctx.compute_pallets_needed()?;
        for order in ctx.orders() {
            debug!(order = order.id.0, pallets_needed = %order.pallets_needed, "估算托盘数");
        }
        Ok(())
    }
}
