// ==========================================
// 领域操作 - 核心结构
// ==========================================

use crate::domain::mounted::{MountedProductId, MountedSpaceId};
use crate::engine::factor_converter::FactorConverter;
use std::fmt;

// ==========================================
// DomainOperations - 领域操作引擎
// ==========================================
// 无状态引擎, 所有装载状态通过上下文传入
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainOperations {
    pub(crate) converter: FactorConverter,
}

impl DomainOperations {
    pub fn new() -> Self {
        Self {
            converter: FactorConverter::new(),
        }
    }

    pub fn converter(&self) -> &FactorConverter {
        &self.converter
    }
}

/// 移动被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    SameSpace,
    NothingToMove,
    TargetUnavailable,
    Capacity,
    PackingRules,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MoveRejection::SameSpace => "SAME_SPACE",
            MoveRejection::NothingToMove => "NOTHING_TO_MOVE",
            MoveRejection::TargetUnavailable => "TARGET_UNAVAILABLE",
            MoveRejection::Capacity => "CAPACITY",
            MoveRejection::PackingRules => "PACKING_RULES",
        };
        write!(f, "{}", text)
    }
}

/// 移动结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        target: MountedSpaceId,
        products: Vec<MountedProductId>,
        quantity: u32,
    },
    Rejected(MoveRejection),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}
