// ==========================================
// 生啤规则
// ==========================================
// 生啤商品优先并入已有的纯生啤托盘, 其次占用空车位
// ==========================================

use crate::engine::context::{PalletizeContext, PlacementTarget};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use rust_decimal::Decimal;

use super::support::{empty_spaces, fill_greedy, sort_by_occupation_desc};

pub struct ChoppRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl ChoppRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("ChoppRule"),
            ops: DomainOperations::new(),
        }
    }

    /// 只含生啤的未满托盘
    fn chopp_pallets(&self, ctx: &PalletizeContext) -> PalletizeResult<Vec<PlacementTarget>> {
        let mut result = Vec::new();
        for ms in ctx.mounted_spaces() {
            if ms.is_full() || ms.occupation <= Decimal::ZERO {
                continue;
            }
            let products = ctx.products_catalog_of(ms.id)?;
            if products.iter().all(|p| p.is_chopp) {
                result.push(PlacementTarget::MountedSpace(ms.id));
            }
        }
        Ok(result)
    }
}

impl Default for ChoppRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ChoppRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.items_with_remaining().iter().any(|i| i.is_chopp())
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let mut ids: Vec<_> = ctx
            .items_with_remaining()
            .iter()
            .filter(|i| i.is_chopp())
            .map(|i| i.id)
            .collect();
        sort_by_occupation_desc(ctx, &mut ids);

        for id in ids {
            let existing = self.chopp_pallets(ctx)?;
            fill_greedy(&self.ops, ctx, id, &existing)?;
            if ctx.item(id)?.packed_remaining() == 0 {
                continue;
            }
            let spaces = empty_spaces(ctx);
            fill_greedy(&self.ops, ctx, id, &spaces)?;
        }
        Ok(())
    }
}
