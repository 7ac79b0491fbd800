// ==========================================
// 洪灾物资调度系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 未核销行必须输出 reason
// ==========================================

pub mod ranking;
pub mod reconcile;

// 重导出核心引擎
pub use ranking::DemandRanker;
pub use reconcile::{LineMatch, ReconcileEngine, ScanReport, UnmatchedLine};
