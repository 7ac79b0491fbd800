// ==========================================
// 洪灾物资调度系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 安置中心扫码签收 + 需求核销
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/迁移）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能统计
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DemandStatus, Priority, ScanOutcome, UnmatchedReason, VerificationStatus,
};

// 领域实体
pub use domain::{
    BoxNgoInfo, CenterSupply, Delivery, Demand, DemandView, Donation, DonationTrack, FloodCenter,
    ManifestLine, Ngo, NgoInventoryEntry, PackLine, PackedBox, SupplyBox, SupplyItem,
    UnmatchedReceipt,
};

// 引擎
pub use engine::{DemandRanker, ReconcileEngine, ScanReport};

// API
pub use api::{DemandApi, DonationApi, NgoApi, PackingApi, ReferenceDataApi, ScanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Flood Relief Logistics";
