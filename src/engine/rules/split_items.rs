// ==========================================
// 拆分规则
// ==========================================
// 单个托盘装不下的剩余商品拆到两个目标, 较小部分低于
// PercentOccupationMinByDivision（占剩余量的百分比）时不拆
// ==========================================

use crate::config::{config_keys, defaults};
use crate::domain::item::ItemId;
use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use tracing::debug;

use super::support::{all_targets_by_capacity_desc, sort_by_occupation_desc};

pub struct SplitItemsRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl SplitItemsRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("SplitItemsRule"),
            ops: DomainOperations::new(),
        }
    }

    /// 找到第一对可拆分目标
    fn find_pair(
        &self,
        ctx: &PalletizeContext,
        item: ItemId,
        min_percent: Decimal,
    ) -> PalletizeResult<Option<(PlacementTarget, PlacementTarget)>> {
        let remaining = ctx.item(item)?.packed_remaining();
        if remaining == 0 {
            return Ok(None);
        }
        let targets = all_targets_by_capacity_desc(ctx);
        let fitting: Vec<(PlacementTarget, u32)> = targets
            .iter()
            .map(|t| Ok((*t, self.ops.quantity_fitting(ctx, *t, item)?)))
            .collect::<PalletizeResult<_>>()?;

        for (i, (first, q1)) in fitting.iter().enumerate() {
            let q1 = (*q1).min(remaining);
            if q1 == 0 || q1 == remaining {
                continue;
            }
            for (second, q2) in fitting.iter().skip(i + 1) {
                let q2 = (*q2).min(remaining - q1);
                if q1 + q2 < remaining {
                    continue;
                }
                let smaller = Decimal::from(q1.min(q2)) * Decimal::ONE_HUNDRED / Decimal::from(remaining);
                if smaller < min_percent {
                    continue;
                }
                return Ok(Some((*first, *second)));
            }
        }
        Ok(None)
    }
}

impl Default for SplitItemsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for SplitItemsRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !ctx.item_ids_with_packed_remaining().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let min_percent: Decimal = ctx.get_setting(
            config_keys::PERCENT_OCCUPATION_MIN_BY_DIVISION,
            Decimal::from(defaults::PERCENT_OCCUPATION_MIN_BY_DIVISION),
        );
        let mut ids = ctx.item_ids_with_packed_remaining();
        sort_by_occupation_desc(ctx, &mut ids);

        for id in ids {
            let Some((first, second)) = self.find_pair(ctx, id, min_percent)? else {
                continue;
            };
            if self.ops.add_on_2_spaces(ctx, id, first, second)? {
                debug!(item = id.0, ?first, ?second, "拆分完成");
            }
        }
        Ok(())
    }
}
