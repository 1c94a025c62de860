// ==========================================
// 散件规则
// ==========================================
// 散件数量放到已有未满托盘（剩余容量降序）, 没有未满托盘时才在空车位开新托盘
// 到处都放不下的商品标记为不可装载
// ==========================================

use crate::engine::context::{PalletizeContext, PlacementOptions, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::{debug, warn};

pub const NO_CAPACITY_FOR_DETACHED: &str = "NO_CAPACITY_FOR_DETACHED";

pub struct DetachedUnitsRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl DetachedUnitsRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("DetachedUnitsRule"),
            ops: DomainOperations::new(),
        }
    }

    /// 未满托盘, 剩余容量降序
    fn targets(&self, ctx: &PalletizeContext) -> Vec<PlacementTarget> {
        let mut list: Vec<_> = ctx
            .mounted_spaces()
            .into_iter()
            .filter(|ms| !ms.is_full())
            .map(|ms| (ms.id, ms.remaining_capacity()))
            .collect();
        list.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        list.into_iter().map(|(id, _)| PlacementTarget::MountedSpace(id)).collect()
    }
}

impl Default for DetachedUnitsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DetachedUnitsRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.items_with_remaining().iter().any(|i| i.detached_remaining() > 0)
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let ids: Vec<_> = ctx
            .items_with_remaining()
            .iter()
            .filter(|i| i.detached_remaining() > 0)
            .map(|i| i.id)
            .collect();

        for id in ids {
            let mut targets = self.targets(ctx);
            if targets.is_empty() {
                if let Some(space) = ctx.spaces().first() {
                    targets.push(PlacementTarget::Space(space.key()));
                }
            }

            for target in targets {
                let remaining = ctx.item(id)?.detached_remaining();
                if remaining == 0 {
                    break;
                }
                let quantity = self.ops.quantity_fitting(ctx, target, id)?.min(remaining);
                if quantity == 0 {
                    continue;
                }
                ctx.add_product(target, id, quantity, PlacementOptions::detached())?;
                debug!(item = id.0, quantity, ?target, "散件装载");
            }

            if ctx.item(id)?.detached_remaining() > 0 {
                warn!(item = id.0, "散件无处可放");
                ctx.mark_non_palletizable(id, NO_CAPACITY_FOR_DETACHED)?;
            }
        }
        Ok(())
    }
}
