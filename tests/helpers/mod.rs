// ==========================================
// 集成测试公共辅助
// ==========================================

#![allow(dead_code)]

pub mod test_data_builder;

pub use test_data_builder::{dec, ContextBuilder, ProductBuilder};

/// 测试日志（重复调用安全）
pub fn init_logging() {
    pallet_mounting::logging::init_test();
}
