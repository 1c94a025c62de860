// ==========================================
// 托盘调换规则
// ==========================================
// 1. 不同尺寸车位之间整托互换, 使占用百分比更接近
// 2. 较空托盘低于 PercentOccupationMinByDivision 时逐个移动商品平衡
// ==========================================

use crate::config::{config_keys, defaults};
use crate::domain::mounted::MountedSpaceId;
use crate::engine::context::PalletizeContext;
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use tracing::debug;

pub struct ChangeProductsRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl ChangeProductsRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("ChangeProductsRule"),
            ops: DomainOperations::new(),
        }
    }

    /// 占用升序的托盘对
    fn pairs(&self, ctx: &PalletizeContext) -> Vec<(MountedSpaceId, MountedSpaceId)> {
        let mut list: Vec<_> = ctx
            .mounted_spaces_with_occupation()
            .into_iter()
            .map(|ms| (ms.id, ms.occupation))
            .collect();
        list.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let mut pairs = Vec::new();
        for (i, (a, _)) in list.iter().enumerate() {
            for (b, _) in list.iter().skip(i + 1) {
                pairs.push((*a, *b));
            }
        }
        pairs
    }
}

impl Default for ChangeProductsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ChangeProductsRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.mounted_spaces_with_occupation().len() > 1
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let min_percent: Decimal = ctx.get_setting(
            config_keys::PERCENT_OCCUPATION_MIN_BY_DIVISION,
            Decimal::from(defaults::PERCENT_OCCUPATION_MIN_BY_DIVISION),
        );

        for (a, b) in self.pairs(ctx) {
            let (Ok(ms_a), Ok(ms_b)) = (ctx.mounted_space(a), ctx.mounted_space(b)) else {
                continue;
            };
            if ms_a.size() == ms_b.size() {
                continue;
            }
            if self.ops.change_product_full_space(ctx, a, b)? {
                debug!(a = a.0, b = b.0, "整托互换");
            }
        }

        for (a, b) in self.pairs(ctx) {
            let (Ok(ms_a), Ok(ms_b)) = (ctx.mounted_space(a), ctx.mounted_space(b)) else {
                continue;
            };
            let emptier = ms_a.occupation_percent().min(ms_b.occupation_percent());
            if emptier >= min_percent {
                continue;
            }
            if self.ops.change_product(ctx, a, b)? {
                debug!(a = a.0, b = b.0, "逐个调换商品");
            }
        }
        Ok(())
    }
}
