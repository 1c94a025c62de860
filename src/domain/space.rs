// ==========================================
// 车辆托盘装载引擎 - 车位领域模型
// ==========================================
// 红线: Space 只存在于空闲池或唯一一个 MountedSpace 中, 不复制
// ==========================================

use crate::domain::types::SpaceSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 车位标识（车位号 + 侧别）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceKey {
    pub number: u32,
    pub side: SpaceSide,
}

impl SpaceKey {
    pub fn new(number: u32, side: SpaceSide) -> Self {
        Self { number, side }
    }
}

impl fmt::Display for SpaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.side)
    }
}

// ==========================================
// Space - 车位
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub number: u32,
    pub side: SpaceSide,
    pub size: Decimal, // 容量
}

impl Space {
    pub fn new(number: u32, side: SpaceSide, size: Decimal) -> Self {
        Self { number, side, size }
    }

    pub fn key(&self) -> SpaceKey {
        SpaceKey {
            number: self.number,
            side: self.side,
        }
    }
}

/// 车位排序: 车位号升序, 同号司机侧在前
pub fn sort_spaces(spaces: &mut [Space]) {
    spaces.sort_by_key(|s| s.key());
}
