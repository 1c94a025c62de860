// ==========================================
// 车辆托盘装载引擎 - 引擎层
// ==========================================
// 职责: 装载上下文、领域操作、规则与规则链、编排
// 红线: 规则只通过上下文读写装载状态
// 红线: 不可行是正常结果, 只有结构性错误终止运行
// ==========================================

pub mod chains;
pub mod context;
pub mod domain_operations;
pub mod error;
pub mod factor_converter;
pub mod orchestrator;
pub mod rule;
pub mod rule_chain;
pub mod rules;

// 重导出核心引擎
pub use context::{
    ContextSnapshot, MinimalSnapshot, PalletizeContext, PlacementOptions, PlacementTarget,
    ReattachReport, ScopeFilter, ScopeGuard,
};
pub use domain_operations::{DomainOperations, MoveOutcome, MoveRejection};
pub use error::{PalletizeError, PalletizeResult};
pub use factor_converter::{FactorConverter, SizeOrFactor};
pub use orchestrator::{
    validate_invariants, LeftoverItem, NotPalletizedPallet, PalletProductSummary, PalletSummary,
    PalletizeSummary, Palletizer,
};
pub use rule::{BaseRule, Rule};
pub use rule_chain::{ErrorPolicy, RuleChain, RuleChainReport, RuleOutcome, RuleRecord};
