// ==========================================
// 托盘合并规则
// ==========================================
// 占用百分比不超过 JoinSpacesMaxOccupationPercent 的托盘按占用升序两两尝试合并,
// 仅合并含相同包装分组的托盘; 每次成功后重新取候选
// ==========================================

use crate::config::{config_keys, defaults};
use crate::domain::mounted::MountedSpaceId;
use crate::engine::context::PalletizeContext;
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;
use tracing::info;

pub struct JoinGroupedSpacesRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl JoinGroupedSpacesRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("JoinGroupedSpacesRule"),
            ops: DomainOperations::new(),
        }
    }

    fn candidates(&self, ctx: &PalletizeContext, max_percent: Decimal) -> Vec<MountedSpaceId> {
        let mut list: Vec<_> = ctx
            .mounted_spaces_with_occupation()
            .into_iter()
            .filter(|ms| ms.occupation_percent() <= max_percent)
            .map(|ms| (ms.id, ms.occupation))
            .collect();
        list.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        list.into_iter().map(|(id, _)| id).collect()
    }

    fn share_group(&self, ctx: &PalletizeContext, a: MountedSpaceId, b: MountedSpaceId) -> PalletizeResult<bool> {
        let groups_a = ctx.packing_groups_of(a)?;
        let groups_b = ctx.packing_groups_of(b)?;
        Ok(!groups_a.is_disjoint(&groups_b))
    }

    /// 一轮合并, 成功一次即返回
    fn join_once(&self, ctx: &mut PalletizeContext, max_percent: Decimal) -> PalletizeResult<bool> {
        let candidates = self.candidates(ctx, max_percent);
        for (i, a) in candidates.iter().enumerate() {
            for b in candidates.iter().skip(i + 1) {
                if !self.share_group(ctx, *a, *b)? {
                    continue;
                }
                if self.ops.join_spaces(ctx, *a, *b)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Default for JoinGroupedSpacesRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for JoinGroupedSpacesRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.mounted_spaces_with_occupation().len() > 1
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let max_percent: Decimal = ctx.get_setting(
            config_keys::JOIN_SPACES_MAX_OCCUPATION_PERCENT,
            Decimal::from(defaults::JOIN_SPACES_MAX_OCCUPATION_PERCENT),
        );
        let mut joined = 0usize;
        while self.join_once(ctx, max_percent)? {
            joined += 1;
        }
        if joined > 0 {
            info!(joined, "合并托盘完成");
        }
        Ok(())
    }
}
