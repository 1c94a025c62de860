// ==========================================
// 整层规则
// ==========================================
// 分层商品的整层数量放到空车位新开的托盘（后续规则仍可向这些托盘装入）, 每层一条已装载记录并记录层号（从 1 开始）
// 不足一层的余量留给后续规则
// ==========================================

use crate::engine::context::{PalletizeContext, PlacementOptions};
use crate::engine::domain_operations::DomainOperations;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::debug;

use super::support::{empty_spaces, sort_by_occupation_desc};

pub struct LayerRule {
    base: BaseRule,
    ops: DomainOperations,
}

impl LayerRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("LayerRule"),
            ops: DomainOperations::new(),
        }
    }
}

impl Default for LayerRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LayerRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        ctx.items_with_remaining().iter().any(|i| i.product.is_layered())
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let mut ids: Vec<_> = ctx
            .items_with_remaining()
            .iter()
            .filter(|i| i.product.is_layered())
            .map(|i| i.id)
            .collect();
        sort_by_occupation_desc(ctx, &mut ids);

        for id in ids {
            let Some(settings) = ctx.item(id)?.product.layer else {
                continue;
            };
            let per_layer = settings.quantity_per_layer;
            let max_layers = if settings.max_layers == 0 {
                u32::MAX
            } else {
                settings.max_layers
            };

            loop {
                let full_layers = ctx.item(id)?.packed_remaining() / per_layer;
                if full_layers == 0 {
                    break;
                }
                let mut placed = false;
                for target in empty_spaces(ctx) {
                    let fitting = self.ops.quantity_fitting(ctx, target, id)? / per_layer;
                    let layers = fitting.min(max_layers).min(full_layers);
                    if layers == 0 {
                        continue;
                    }
                    for index in 1..=layers {
                        ctx.add_product(target, id, per_layer, PlacementOptions::layer(index))?;
                    }
                    debug!(item = id.0, layers, "整层装载");
                    placed = true;
                    break;
                }
                if !placed {
                    break;
                }
            }
        }
        Ok(())
    }
}
