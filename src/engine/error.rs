// ==========================================
// 车辆托盘装载引擎 - 引擎层错误类型
// ==========================================
// 分类: 目录错误(结构性, 终止) / 状态错误 / 规则执行错误
// 红线: 容量/分组不可行不是错误, 由 bool 或 MoveOutcome 表达
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::error::DomainError;
use crate::domain::item::ItemId;
use crate::domain::mounted::{ContainerId, MountedProductId, MountedSpaceId};
use crate::domain::space::SpaceKey;
use rust_decimal::Decimal;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum PalletizeError {
    // ===== 目录错误（结构性） =====
    #[error("缺少装载系数: product_code={product_code}, space_size={space_size}")]
    MissingFactor {
        product_code: u32,
        space_size: Decimal,
    },

    #[error("输入数据错误: {0}")]
    InvalidInput(String),

    // ===== 引用错误 =====
    #[error("商品未找到: {0:?}")]
    ItemNotFound(ItemId),

    #[error("托盘未找到: {0:?}")]
    MountedSpaceNotFound(MountedSpaceId),

    #[error("容器未找到: {0:?}")]
    ContainerNotFound(ContainerId),

    #[error("已装载商品未找到: {0:?}")]
    MountedProductNotFound(MountedProductId),

    #[error("车位不可用: {0}")]
    SpaceNotAvailable(SpaceKey),

    // ===== 状态错误 =====
    #[error("超出车位容量: space={space}, occupation={occupation}, to_add={to_add}, size={size}")]
    CapacityExceeded {
        space: SpaceKey,
        occupation: Decimal,
        to_add: Decimal,
        size: Decimal,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("无效的上下文状态: {0}")]
    InvalidState(String),

    #[error("不变量被破坏: {0}")]
    InvariantViolation(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PalletizeError {
    /// 结构性错误: 目录或输入数据问题, 应终止本次运行
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PalletizeError::MissingFactor { .. }
                | PalletizeError::InvalidInput(_)
                | PalletizeError::InvariantViolation(_)
        )
    }

    /// 错误分类标识（用于规则链记录）
    pub fn kind(&self) -> &'static str {
        match self {
            PalletizeError::MissingFactor { .. } => "MISSING_FACTOR",
            PalletizeError::InvalidInput(_) => "INVALID_INPUT",
            PalletizeError::ItemNotFound(_)
            | PalletizeError::MountedSpaceNotFound(_)
            | PalletizeError::ContainerNotFound(_)
            | PalletizeError::MountedProductNotFound(_)
            | PalletizeError::SpaceNotAvailable(_) => "NOT_FOUND",
            PalletizeError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            PalletizeError::Domain(_) => "DOMAIN",
            PalletizeError::InvalidState(_) => "INVALID_STATE",
            PalletizeError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            PalletizeError::Other(_) => "OTHER",
        }
    }
}

/// Result 类型别名
pub type PalletizeResult<T> = Result<T, PalletizeError>;
