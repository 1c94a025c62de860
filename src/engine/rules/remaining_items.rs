use crate::engine::context::PalletizeContext;
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::debug;

use super::support::{all_targets_by_capacity_desc, fill_greedy, sort_by_occupation_desc};

/// 剩余商品按目标剩余容量降序尽量装载（允许多处拆分）
pub struct RemainingItemsRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl RemainingItemsRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("RemainingItemsRule"),
            ops: DomainOperations::new(),
        }
    }
}

impl Default for RemainingItemsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RemainingItemsRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !ctx.item_ids_with_packed_remaining().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let mut ids = ctx.item_ids_with_packed_remaining();
        sort_by_occupation_desc(ctx, &mut ids);
        for id in ids {
            let targets = all_targets_by_capacity_desc(ctx);
            let placed = fill_greedy(&self.ops, ctx, id, &targets)?;
            if placed > 0 {
                debug!(item = id.0, placed, "剩余商品装载");
            }
        }
        Ok(())
    }
}
