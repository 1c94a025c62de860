// ==========================================
// 车辆托盘装载引擎 - 领域操作
// ==========================================
// 职责: 可行性判断 + 托盘间移动/拆分/重平衡算法
// 红线: 不可行返回 false 或 MoveOutcome::Rejected, 不是错误
// 红线: 所有检查先于任何修改（无部分修改）
// ==========================================
// 注: 重平衡是局部搜索, 每次只处理两个托盘, 候选顺序由规则决定
// ==========================================

mod core;
mod feasibility;
mod movement;
mod rebalance;
mod split;

#[cfg(test)]
mod tests;

pub use self::core::{DomainOperations, MoveOutcome, MoveRejection};
