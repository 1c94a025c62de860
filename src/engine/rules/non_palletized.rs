use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;
use crate::engine::rule::{BaseRule, Rule};
use tracing::warn;

pub const NO_CAPACITY: &str = "NO_CAPACITY";
pub const DETACHED_NO_CAPACITY: &str = "DETACHED_NO_CAPACITY";

/// 记录装载结束后仍有剩余的商品
pub struct NonPalletizedRule {
    base: BaseRule,
}

impl NonPalletizedRule {
    pub fn new() -> Self {
        Self {
            base: BaseRule::new("NonPalletizedRule"),
        }
    }
}

impl Default for NonPalletizedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NonPalletizedRule {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn should_execute(&self, ctx: &PalletizeContext) -> bool {
        !ctx.items_with_remaining().is_empty()
    }

    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()> {
        let leftovers: Vec<_> = ctx
            .items_with_remaining()
            .iter()
            .map(|i| (i.id, i.code, i.amount_remaining(), i.packed_remaining()))
            .collect();
        for (id, code, remaining, packed) in leftovers {
            let reason = if packed == 0 { DETACHED_NO_CAPACITY } else { NO_CAPACITY };
            warn!(product_code = code, remaining, reason, "商品未能装载");
            ctx.mark_non_palletizable(id, reason)?;
        }
        Ok(())
    }
}
