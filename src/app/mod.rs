// ==========================================
// 洪灾物资调度系统 - 应用层
// ==========================================
// 职责: 装配仓储 / 引擎 / API，供控制台与工具程序使用
// ==========================================

pub mod demo;
pub mod state;

// 重导出
pub use demo::{seed_demo_data, DemoSummary};
pub use state::{get_default_db_path, resolve_db_path, AppState, DB_PATH_ENV};
