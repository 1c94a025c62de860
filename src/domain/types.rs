// ==========================================
// 车辆托盘装载引擎 - 领域类型定义
// ==========================================
// 职责: 车位侧别、安全侧、地图类型、包装类型等基础枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 车位侧别 (Space Side)
// ==========================================
// 排序约定: 同一车位号下司机侧在前
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceSide {
    Driver, // 司机侧
    Helper, // 助手侧
}

impl SpaceSide {
    /// 对侧
    pub fn opposite(&self) -> Self {
        match self {
            SpaceSide::Driver => SpaceSide::Helper,
            SpaceSide::Helper => SpaceSide::Driver,
        }
    }

    /// 从输入字符串解析侧别（兼容单字母缩写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRIVER" | "D" => Some(SpaceSide::Driver),
            "HELPER" | "H" => Some(SpaceSide::Helper),
            _ => None,
        }
    }
}

impl fmt::Display for SpaceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceSide::Driver => write!(f, "DRIVER"),
            SpaceSide::Helper => write!(f, "HELPER"),
        }
    }
}

// ==========================================
// 安全侧 (Safe Side)
// ==========================================
// 卸货安全: 决定某个配送单的货物应位于车辆哪一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafeSide {
    Driver,
    Helper,
    #[default]
    Indifferent, // 无要求
}

impl SafeSide {
    /// 判断某个车位侧别是否满足安全侧要求
    pub fn accepts(&self, side: SpaceSide) -> bool {
        match self {
            SafeSide::Driver => side == SpaceSide::Driver,
            SafeSide::Helper => side == SpaceSide::Helper,
            SafeSide::Indifferent => true,
        }
    }
}

impl From<SpaceSide> for SafeSide {
    fn from(side: SpaceSide) -> Self {
        match side {
            SpaceSide::Driver => SafeSide::Driver,
            SpaceSide::Helper => SafeSide::Helper,
        }
    }
}

impl fmt::Display for SafeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeSide::Driver => write!(f, "DRIVER"),
            SafeSide::Helper => write!(f, "HELPER"),
            SafeSide::Indifferent => write!(f, "INDIFFERENT"),
        }
    }
}

// ==========================================
// 地图类型 (Map Kind)
// ==========================================
// 同一引擎, 不同规则选择与上下文范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapKind {
    Route,        // 路线: 多站合并为单个虚拟订单
    As,           // 客户专属托盘
    Mixed,        // 混合: 客户专属 + 共享
    CrossDocking, // 越库: 按支撑点分组
    T4,           // T4 车型
    #[default]
    Common,
}

impl MapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapKind::Route => "route",
            MapKind::As => "as",
            MapKind::Mixed => "mixed",
            MapKind::CrossDocking => "cross_docking",
            MapKind::T4 => "t4",
            MapKind::Common => "common",
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "route" => Ok(MapKind::Route),
            "as" => Ok(MapKind::As),
            "mixed" => Ok(MapKind::Mixed),
            "cross_docking" | "cross-docking" | "crossdocking" => Ok(MapKind::CrossDocking),
            "t4" => Ok(MapKind::T4),
            "common" => Ok(MapKind::Common),
            other => Err(format!("未知地图类型: {}", other)),
        }
    }
}

// ==========================================
// 包装类型 (Container Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Returnable, // 可回收瓶/箱
    #[default]
    Disposable, // 一次性包装
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerType::Returnable => write!(f, "RETURNABLE"),
            ContainerType::Disposable => write!(f, "DISPOSABLE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_side_ordering_driver_first() {
        assert!(SpaceSide::Driver < SpaceSide::Helper);
        assert_eq!(SpaceSide::Driver.opposite(), SpaceSide::Helper);
        assert_eq!(SpaceSide::parse("h"), Some(SpaceSide::Helper));
        assert_eq!(SpaceSide::parse("x"), None);
    }

    #[test]
    fn test_safe_side_accepts() {
        assert!(SafeSide::Indifferent.accepts(SpaceSide::Driver));
        assert!(SafeSide::Helper.accepts(SpaceSide::Helper));
        assert!(!SafeSide::Helper.accepts(SpaceSide::Driver));
    }

    #[test]
    fn test_map_kind_from_str() {
        assert_eq!("cross-docking".parse::<MapKind>(), Ok(MapKind::CrossDocking));
        assert!("unknown".parse::<MapKind>().is_err());
    }
}
