// ==========================================
// 车辆托盘装载引擎 - 装载规则
// ==========================================
// 每个规则是一个策略单元, 由规则链按顺序执行
// 红线: 所有放置都经过 DomainOperations 可行性判断
// ==========================================

mod change_products;
mod chopp;
mod detached;
mod equalization;
mod group;
mod join_spaces;
mod layer;
mod merge;
mod non_palletized;
mod pallets_needed;
mod per_order;
mod remaining_items;
mod reorder;
mod safe_side;
mod split_items;
pub(crate) mod support;

#[cfg(test)]
mod tests;

pub use change_products::ChangeProductsRule;
pub use chopp::ChoppRule;
pub use detached::{DetachedUnitsRule, NO_CAPACITY_FOR_DETACHED};
pub use equalization::PalletEqualizationRule;
pub use group::{PalletGroupRule, PalletGroupSubGroupRule};
pub use join_spaces::JoinGroupedSpacesRule;
pub use layer::LayerRule;
pub use merge::{MergeOrdersRule, UnmergeOrdersRule};
pub use non_palletized::{NonPalletizedRule, DETACHED_NO_CAPACITY, NO_CAPACITY};
pub use pallets_needed::ComputePalletsNeededRule;
pub use per_order::{OrderGrouping, PerOrderRule};
pub use remaining_items::RemainingItemsRule;
pub use reorder::{AssemblyStage, ReorderRule};
pub use safe_side::SafeSideRule;
pub use split_items::SplitItemsRule;
