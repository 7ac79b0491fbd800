// ==========================================
// 洪灾物资调度系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod delivery;
pub mod demand;
pub mod donation;
pub mod ngo;
pub mod reference;
pub mod supply_box;
pub mod types;

// 重导出核心类型
pub use delivery::{Delivery, NewDelivery, UnmatchedReceipt};
pub use demand::{Demand, DemandView, NewDemand};
pub use donation::{Donation, DonationAllocation, DonationTrack, NewDonation};
pub use ngo::{BoxNgoInfo, NewNgo, NewNgoInventory, Ngo, NgoInventoryEntry};
pub use reference::{
    CenterSupply, FloodCenter, NewCenterSupply, NewFloodCenter, NewSupplyItem, SupplyItem,
};
pub use supply_box::{ManifestLine, PackLine, PackedBox, SupplyBox};
pub use types::{DemandStatus, Priority, ScanOutcome, UnmatchedReason, VerificationStatus};
