// ==========================================
// 日志系统初始化
// ==========================================
// tracing + tracing-subscriber
// 规则链/规则/编排器的 span 与结构化字段由调用方输出, 这里只负责订阅端
// 环境变量: RUST_LOG（过滤）, PALLET_LOG_FORMAT（text | json）
// ==========================================

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤: 本库 info, 依赖 warn
const DEFAULT_FILTER: &str = "warn,pallet_mounting=info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// 每行一个 JSON 对象, 便于收集装载运行记录
    Json,
}

impl LogFormat {
    /// 从 PALLET_LOG_FORMAT 读取, 无法识别时使用文本格式
    pub fn from_env() -> Self {
        match std::env::var("PALLET_LOG_FORMAT") {
            Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: warn,pallet_mounting=info）
///   例如: RUST_LOG=pallet_mounting::engine::rules=debug
/// - PALLET_LOG_FORMAT: text（默认）或 json
///
/// # 示例
/// ```no_run
/// use pallet_mounting::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with(LogFormat::from_env());
}

/// 按指定格式初始化; 已初始化时忽略
pub fn init_with(format: LogFormat) {
    let filter = env_filter(DEFAULT_FILTER);
    let result = match format {
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(false)
            .with_span_events(FmtSpan::CLOSE)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("日志系统已初始化");
    }
}

/// 初始化测试环境的日志系统
///
/// 规则级 debug 输出, 写入测试捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("pallet_mounting=debug"))
        .with_test_writer()
        .try_init();
}
