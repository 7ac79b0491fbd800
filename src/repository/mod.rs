// ==========================================
// 洪灾物资调度系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod box_repo;
pub mod center_stock_repo;
pub mod delivery_repo;
pub mod demand_repo;
pub mod donation_repo;
pub mod error;
pub mod ngo_repo;
pub mod reconcile_store;
pub mod reference_repo;

// 重导出核心仓储
pub use box_repo::SupplyBoxRepository;
pub use center_stock_repo::CenterStockRepository;
pub use delivery_repo::DeliveryRepository;
pub use demand_repo::DemandRepository;
pub use donation_repo::DonationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use ngo_repo::NgoRepository;
pub use reconcile_store::{ReconcileStore, ScanStore, SqliteReconcileStore, SqliteScanScope};
pub use reference_repo::ReferenceDataRepository;
