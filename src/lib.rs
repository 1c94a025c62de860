// ==========================================
// 车辆托盘装载引擎 - 核心库
// ==========================================
// 职责: 把配送订单的商品分配到车辆车位（托盘）
// 结构: 领域模型 -> 装载上下文 -> 领域操作 -> 规则链
// 运行方式: 单线程同步, 一次运行一个上下文
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 上下文/规则/编排
pub mod engine;

// 配置层 - 装载参数
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ContainerType, MapKind, SafeSide, SpaceSide};

// 领域实体
pub use domain::{
    Item, ItemId, MountedProduct, MountedSpace, Order, OrderId, PalletizeInput, Product,
    ProductCatalog, Space, SpaceKey,
};

// 引擎
pub use engine::{
    DomainOperations, ErrorPolicy, PalletizeContext, PalletizeError, PalletizeResult,
    PalletizeSummary, Palletizer, RuleChain,
};

// 配置
pub use config::{config_keys, PalletizeSettings};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车辆托盘装载引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
