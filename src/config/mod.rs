// ==========================================
// 车辆托盘装载引擎 - 配置层
// ==========================================
// 职责: 装载参数管理, 规则通过 Context::get_setting 读取
// 存储: 单次运行内存（来源为输入文档 Settings）
// ==========================================

pub mod settings;

// 重导出核心配置类型
pub use settings::{config_keys, defaults, FromSetting, PalletizeSettings, SettingValue};
