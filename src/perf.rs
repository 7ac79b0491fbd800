// ==========================================
// 洪灾物资调度系统 - 操作级 SQL 开销统计
// ==========================================
// 基于 rusqlite trace/profile 回调 + 线程内操作帧栈:
// - 每个 PerfGuard 压入一帧，帧内累计语句数、慢语句数、最慢语句
// - 帧可嵌套，内层语句同时计入所有外层帧
// 开关:
// - FLOOD_RELIEF_PERF_SQL=1 强制开启（Debug 默认开启，Release 默认关闭）
// - FLOOD_RELIEF_SLOW_SQL_MS=50 慢 SQL 阈值（毫秒）
// ==========================================

use rusqlite::Connection;
use serde::Serialize;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const ENV_PERF_SQL: &str = "FLOOD_RELIEF_PERF_SQL";
const ENV_SLOW_SQL_MS: &str = "FLOOD_RELIEF_SLOW_SQL_MS";
const SQL_PREVIEW_CHARS: usize = 200;

static SLOW_THRESHOLD_MS: AtomicU64 = AtomicU64::new(u64::MAX);

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

// ==========================================
// PerfSettings - 统计开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl PerfSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(ENV_PERF_SQL)
            .map(|v| is_truthy(&v))
            .unwrap_or(cfg!(debug_assertions));
        let slow_ms = lookup(ENV_SLOW_SQL_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// 把多行 SQL 压成一行并截断，便于日志检索
fn sql_preview(sql: &str) -> String {
    let mut out = String::new();
    for (i, word) in sql.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    match out.char_indices().nth(SQL_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &out[..cut]),
        None => out,
    }
}

/// 为连接安装 SQL 统计回调（关闭时卸载）
pub fn install_sqlite_tracing(conn: &mut Connection, settings: PerfSettings) {
    if !settings.enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }
    SLOW_THRESHOLD_MS.store(settings.slow_ms, Ordering::Relaxed);
    conn.trace(Some(on_statement));
    conn.profile(Some(on_profile));
}

fn on_statement(_sql: &str) {
    FRAMES.with(|frames| {
        for frame in frames.borrow_mut().iter_mut() {
            frame.statements += 1;
        }
    });
}

fn on_profile(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    if ms < SLOW_THRESHOLD_MS.load(Ordering::Relaxed) {
        return;
    }

    let preview = sql_preview(sql);
    tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %preview, "slow sql");
    FRAMES.with(|frames| {
        for frame in frames.borrow_mut().iter_mut() {
            frame.slow_statements += 1;
            if frame.slowest.as_ref().map_or(true, |(prev, _)| ms > *prev) {
                frame.slowest = Some((ms, preview.clone()));
            }
        }
    });
}

#[derive(Debug, Clone, Default)]
struct Frame {
    statements: u64,
    slow_statements: u64,
    slowest: Option<(u64, String)>,
}

/// 一次操作的统计快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpStats {
    pub op: &'static str,
    pub elapsed_ms: u64,
    pub sql_count: u64,
    pub slow_sql_count: u64,
    pub slowest_sql: Option<String>,
}

// ==========================================
// PerfGuard - 操作帧
// ==========================================
/// 创建时压帧，`finish` 或 drop 时出栈并输出一条 perf 日志
///
/// ```ignore
/// let perf = flood_relief_logistics::perf::PerfGuard::new("reconcile_scan");
/// // ... 执行 SQL
/// let stats = perf.finish();
/// ```
pub struct PerfGuard {
    op: &'static str,
    started: Instant,
    depth: usize,
    closed: bool,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(Frame::default());
            frames.len()
        });
        Self {
            op,
            started: Instant::now(),
            depth,
            closed: false,
        }
    }

    /// 当前帧的统计（不出栈）
    pub fn snapshot(&self) -> OpStats {
        let frame = FRAMES.with(|frames| {
            frames
                .borrow()
                .get(self.depth - 1)
                .cloned()
                .unwrap_or_default()
        });
        self.stats_from(frame)
    }

    /// 结束统计并返回快照
    pub fn finish(mut self) -> OpStats {
        self.close()
    }

    fn stats_from(&self, frame: Frame) -> OpStats {
        OpStats {
            op: self.op,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            sql_count: frame.statements,
            slow_sql_count: frame.slow_statements,
            slowest_sql: frame.slowest.map(|(_, sql)| sql),
        }
    }

    fn close(&mut self) -> OpStats {
        let frame = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            let at = (self.depth - 1).min(frames.len());
            let frame = frames.drain(at..).next().unwrap_or_default();
            frame
        });
        self.closed = true;

        let stats = self.stats_from(frame);
        tracing::info!(
            target: "perf",
            op = stats.op,
            elapsed_ms = stats.elapsed_ms,
            sql_count = stats.sql_count,
            slow_sql_count = stats.slow_sql_count,
            slowest_sql = stats.slowest_sql.as_deref().unwrap_or(""),
            "done"
        );
        stats
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.close();
        }
    }
}
