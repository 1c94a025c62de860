// ==========================================
// 车辆托盘装载引擎 - 装载参数
// ==========================================
// 职责: 具名布尔/数值参数的加载、类型化读取与快照
// 来源: 输入文档 Settings 对象
// ==========================================

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<Decimal> for SettingValue {
    fn from(v: Decimal) -> Self {
        SettingValue::Number(v)
    }
}

impl From<u32> for SettingValue {
    fn from(v: u32) -> Self {
        SettingValue::Number(Decimal::from(v))
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

// ==========================================
// FromSetting - 类型化读取
// ==========================================
pub trait FromSetting: Sized {
    fn from_setting(value: &SettingValue) -> Option<Self>;
}

impl FromSetting for bool {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Number(n) => Some(!n.is_zero()),
            SettingValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Some(true),
                "false" | "0" | "no" | "n" => Some(false),
                _ => None,
            },
        }
    }
}

impl FromSetting for Decimal {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Number(n) => Some(*n),
            SettingValue::Text(s) => Decimal::from_str(s.trim()).ok(),
            SettingValue::Bool(_) => None,
        }
    }
}

impl FromSetting for u32 {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        use rust_decimal::prelude::ToPrimitive;
        Decimal::from_setting(value).and_then(|d| d.trunc().to_u32())
    }
}

impl FromSetting for usize {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        use rust_decimal::prelude::ToPrimitive;
        Decimal::from_setting(value).and_then(|d| d.trunc().to_usize())
    }
}

impl FromSetting for String {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Text(s) => Some(s.clone()),
            SettingValue::Bool(b) => Some(b.to_string()),
            SettingValue::Number(n) => Some(n.to_string()),
        }
    }
}

// ==========================================
// PalletizeSettings - 参数集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PalletizeSettings {
    values: BTreeMap<String, SettingValue>,
}

impl PalletizeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从输入文档的 Settings 对象加载
    ///
    /// 数组/对象/null 值不被识别, 记录告警后忽略
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut settings = Self::new();
        for (key, value) in map {
            let parsed = match value {
                Value::Bool(b) => Some(SettingValue::Bool(*b)),
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain))
                    .map(SettingValue::Number),
                Value::String(s) => Some(SettingValue::Text(s.clone())),
                _ => None,
            };
            match parsed {
                Some(v) => {
                    settings.values.insert(key.clone(), v);
                }
                None => warn!(key = %key, "忽略无法识别的参数值"),
            }
        }
        settings
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let map: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self::from_json_map(&map))
    }

    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 读取参数, 缺失或类型不符时返回默认值
    pub fn get_setting<T: FromSetting>(&self, key: &str, default: T) -> T {
        match self.values.get(key) {
            Some(value) => match T::from_setting(value) {
                Some(v) => v,
                None => {
                    warn!(key = %key, ?value, "参数类型不符, 使用默认值");
                    default
                }
            },
            None => default,
        }
    }

    /// 参数快照（JSON）, 用于结果复现
    pub fn snapshot_json(&self) -> String {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    SettingValue::Bool(b) => Value::Bool(*b),
                    SettingValue::Number(n) => Value::String(n.to_string()),
                    SettingValue::Text(s) => Value::String(s.clone()),
                };
                (k.clone(), value)
            })
            .collect();
        Value::Object(map).to_string()
    }
}

// ==========================================
// 参数键
// ==========================================
pub mod config_keys {
    // 包装分组限制
    pub const SHOULD_LIMIT_PACKAGE_GROUPS: &str = "ShouldLimitPackageGroups";
    pub const MAX_PACKAGE_GROUPS: &str = "MaxPackageGroups";

    // 占用计算
    pub const OCCUPATION_ADJUSTMENT_TO_PREVENT_EXCESS_HEIGHT: &str =
        "OccupationAdjustmentToPreventExcessHeight";
    pub const PERCENT_OCCUPATION_MIN_BY_DIVISION: &str = "PercentOccupationMinByDivision";

    // 托盘均衡
    pub const PALLET_EQUALIZATION_RULE: &str = "PalletEqualizationRule";
    pub const PALLET_EQUALIZATION_MINORITY_PERCENT: &str = "PalletEqualizationMinorityPercent";
    pub const PALLET_EQUALIZATION_MIN_OCCUPATION_PERCENT: &str =
        "PalletEqualizationMinOccupationPercent";

    // 安全侧
    pub const ENABLE_SAFE_SIDE_RULE: &str = "EnableSafeSideRule";
    pub const MAX_SAFE_SIDE_COMBINATIONS: &str = "MaxSafeSideCombinations";

    // 托盘共存策略
    pub const CHOPP_EXCLUSIVE_PALLET: &str = "ChoppExclusivePallet";
    pub const SEPARATE_RETURNABLE_FROM_DISPOSABLE: &str = "SeparateReturnableFromDisposable";

    // 合并/排序
    pub const JOIN_SPACES_MAX_OCCUPATION_PERCENT: &str = "JoinSpacesMaxOccupationPercent";
    pub const ENABLE_REORDER_RULE: &str = "EnableReorderRule";
}

// ==========================================
// 参数默认值
// ==========================================
pub mod defaults {
    pub const MAX_PACKAGE_GROUPS: u32 = 3;
    pub const PALLET_EQUALIZATION_MINORITY_PERCENT: u32 = 30;
    pub const PALLET_EQUALIZATION_MIN_OCCUPATION_PERCENT: u32 = 70;
    pub const PERCENT_OCCUPATION_MIN_BY_DIVISION: u32 = 20;
    pub const MAX_SAFE_SIDE_COMBINATIONS: usize = 4096;
    pub const JOIN_SPACES_MAX_OCCUPATION_PERCENT: u32 = 50;
}
