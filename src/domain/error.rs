// ==========================================
// 车辆托盘装载引擎 - 领域层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 领域实体不变量错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("剩余数量不足: item_code={code}, requested={requested}, remaining={remaining}")]
    InsufficientAmount {
        code: u32,
        requested: u32,
        remaining: u32,
    },

    #[error("散件数量不足: item_code={code}, requested={requested}, remaining={remaining}")]
    InsufficientDetached {
        code: u32,
        requested: u32,
        remaining: u32,
    },

    #[error("配送单数量合计不一致: item_code={code}, expected={expected}, actual={actual}")]
    DeliveryOrderMismatch { code: u32, expected: u32, actual: u32 },

    #[error("散件数量超过总量: item_code={code}, detached={detached}, amount={amount}")]
    DetachedExceedsAmount { code: u32, detached: u32, amount: u32 },
}

/// Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
