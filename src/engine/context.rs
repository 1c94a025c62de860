// ==========================================
// 车辆托盘装载引擎 - 装载上下文
// ==========================================
// 职责: 共享可变聚合根
// - 持有订单/商品/空闲车位/已装载托盘
// - 提供带范围过滤的查询视图
// - 提供唯一的装载扣减路径
// - 快照/恢复、订单合并/拆分
// ==========================================
// 红线: 所有规则只通过本上下文读写装载状态
// ==========================================

mod builder;
mod core;
mod merge;
mod mutations;
mod queries;
mod scope;
mod snapshot;


pub use self::core::{PalletizeContext, PlacementState};
pub use merge::{MergeStash, ReattachReport};
pub use mutations::{PlacementOptions, PlacementTarget};
pub use scope::{ScopeFilter, ScopeGuard};
pub use snapshot::{ContextSnapshot, MinimalSnapshot};
