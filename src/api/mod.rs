// ==========================================
// 洪灾物资调度系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供扫码站 / 控制台调用
// ==========================================

pub mod demand_api;
pub mod donation_api;
pub mod error;
pub mod ngo_api;
pub mod packing_api;
pub mod reference_api;
pub mod scan_api;

// 重导出核心类型
pub use demand_api::{DemandApi, PendingAlerts};
pub use donation_api::{DonationApi, DonationResponse};
pub use error::{ApiError, ApiResult};
pub use ngo_api::NgoApi;
pub use packing_api::{PackResponse, PackingApi};
pub use reference_api::ReferenceDataApi;
pub use scan_api::{ScanApi, ScanResponse};
