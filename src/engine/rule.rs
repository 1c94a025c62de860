// ==========================================
// 车辆托盘装载引擎 - 规则接口
// ==========================================
// 规则 = 一个策略单元: should_execute 门控 + execute 修改上下文
// 红线: 规则只通过上下文视图和变更方法访问装载状态
// ==========================================

use crate::engine::context::PalletizeContext;
use crate::engine::error::PalletizeResult;

// ==========================================
// Rule Trait
// ==========================================
pub trait Rule {
    /// 规则名称（日志与执行记录使用）
    fn name(&self) -> &str;

    /// 是否需要执行（默认总是执行）
    fn should_execute(&self, _ctx: &PalletizeContext) -> bool {
        true
    }

    /// 执行规则
    fn execute(&self, ctx: &mut PalletizeContext) -> PalletizeResult<()>;
}

// ==========================================
// BaseRule - 规则公共部分
// ==========================================
// 规则名 + 可选的启用参数
#[derive(Debug, Clone)]
pub struct BaseRule {
    name: &'static str,
    enabled_by: Option<(&'static str, bool)>,
}

impl BaseRule {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            enabled_by: None,
        }
    }

    /// 由参数控制是否启用
    ///
    /// # 参数
    /// - `key`: 参数键
    /// - `default`: 参数缺失时是否启用
    pub fn gated(name: &'static str, key: &'static str, default: bool) -> Self {
        Self {
            name,
            enabled_by: Some((key, default)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self, ctx: &PalletizeContext) -> bool {
        match self.enabled_by {
            Some((key, default)) => ctx.get_setting(key, default),
            None => true,
        }
    }
}
