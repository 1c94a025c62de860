// ==========================================
// 车辆托盘装载引擎 - 规则链
// ==========================================
// 职责: 顺序执行规则, 记录每条规则的执行结果
// 状态: Skipped（门控未通过）/ Executed / Failed（执行出错）
// 红线: 每条规则执行后恢复过滤深度（规则遗留的过滤必须清除）
// 红线: 执行出错的规则回滚到执行前快照, 不留下部分修改
// ==========================================

use crate::engine::context::PalletizeContext;
use crate::engine::error::{PalletizeError, PalletizeResult};
use crate::engine::rule::Rule;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 规则出错时的链策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorPolicy {
    /// 结构性错误（目录/输入）终止, 其余记录后继续
    #[default]
    AbortOnStructural,
    /// 所有错误都记录后继续
    ContinueAlways,
    /// 任何错误都终止
    StopOnAnyError,
}

/// 单条规则执行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleOutcome {
    Skipped,
    Executed,
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleRecord {
    pub rule: String,
    pub outcome: RuleOutcome,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// 规则链执行报告
#[derive(Debug, Clone, Serialize)]
pub struct RuleChainReport {
    pub run_id: Uuid,
    pub chain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<RuleRecord>,
}

impl RuleChainReport {
    pub fn executed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == RuleOutcome::Executed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == RuleOutcome::Skipped)
            .count()
    }

    pub fn failures(&self) -> Vec<&RuleRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Failed { .. }))
            .collect()
    }

    pub fn outcome_of(&self, rule: &str) -> Option<&RuleOutcome> {
        self.records.iter().find(|r| r.rule == rule).map(|r| &r.outcome)
    }
}

// ==========================================
// RuleChain - 规则链
// ==========================================
pub struct RuleChain {
    name: String,
    rules: Vec<Box<dyn Rule>>,
    policy: ErrorPolicy,
}

impl RuleChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 追加规则（构建器风格）
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 顺序执行全部规则
    ///
    /// # 返回
    /// - `Ok(report)`: 链执行完毕（可能包含 Failed 记录）
    /// - `Err(e)`: 按错误策略终止
    #[instrument(skip(self, ctx), fields(chain = %self.name, rules = self.rules.len()))]
    pub fn execute_chain(&self, ctx: &mut PalletizeContext) -> PalletizeResult<RuleChainReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut records = Vec::with_capacity(self.rules.len());
        info!(run_id = %run_id, "开始执行规则链");

        for rule in &self.rules {
            let rule_started = Utc::now();
            let clock = Instant::now();
            let depth = ctx.filter_depth();

            if !rule.should_execute(ctx) {
                debug!(rule = rule.name(), "规则跳过");
                records.push(RuleRecord {
                    rule: rule.name().to_string(),
                    outcome: RuleOutcome::Skipped,
                    started_at: rule_started,
                    elapsed_ms: 0,
                });
                continue;
            }

            let snapshot = ctx.create_snapshot();
            let result = rule.execute(ctx);
            if ctx.filter_depth() != depth {
                warn!(
                    rule = rule.name(),
                    expected = depth,
                    actual = ctx.filter_depth(),
                    "规则遗留范围过滤, 已清除"
                );
                ctx.truncate_filters(depth);
            }
            let elapsed_ms = clock.elapsed().as_millis() as u64;

            let outcome = match result {
                Ok(()) => {
                    debug!(rule = rule.name(), elapsed_ms, "规则执行完成");
                    RuleOutcome::Executed
                }
                Err(e) => {
                    ctx.restore_snapshot(snapshot);
                    if self.should_abort(&e) {
                        error!(rule = rule.name(), kind = e.kind(), error = %e, "规则执行失败, 终止规则链");
                        return Err(e);
                    }
                    warn!(rule = rule.name(), kind = e.kind(), error = %e, "规则执行失败, 继续执行");
                    RuleOutcome::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    }
                }
            };
            records.push(RuleRecord {
                rule: rule.name().to_string(),
                outcome,
                started_at: rule_started,
                elapsed_ms,
            });
        }

        let report = RuleChainReport {
            run_id,
            chain: self.name.clone(),
            started_at,
            finished_at: Utc::now(),
            records,
        };
        info!(
            run_id = %run_id,
            executed = report.executed_count(),
            skipped = report.skipped_count(),
            failed = report.failures().len(),
            "规则链执行完成"
        );
        Ok(report)
    }

    fn should_abort(&self, error: &PalletizeError) -> bool {
        match self.policy {
            ErrorPolicy::AbortOnStructural => error.is_structural(),
            ErrorPolicy::ContinueAlways => false,
            ErrorPolicy::StopOnAnyError => true,
        }
    }
}
