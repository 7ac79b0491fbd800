// ==========================================
// 洪灾物资调度系统 - NGO 领域模型
// ==========================================
// NGO 登记 / NGO 库存入库 / 物资箱所属 NGO
// ==========================================

use crate::domain::types::{Priority, VerificationStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Ngo - 救援组织
// ==========================================
// 对齐: ngos 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ngo {
    pub ngo_id: i64,
    pub name: String,
    pub registration_no: Option<String>, // 社团注册号
    pub contact_email: Option<String>,
    pub verification_status: VerificationStatus,
}

/// 登记 NGO 的输入（新登记一律 Pending）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNgo {
    pub name: String,
    pub registration_no: Option<String>,
    pub contact_email: Option<String>,
}

// ==========================================
// NgoInventoryEntry - NGO 库存入库记录
// ==========================================
// 对齐: ngo_inventory 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgoInventoryEntry {
    pub inventory_id: i64,
    pub ngo_id: i64,
    pub item_id: i64,
    pub item_name: Option<String>,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub batch_id: Option<String>,
    pub last_updated: NaiveDateTime,
    pub source: Option<String>, // 来源 / 供应商
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNgoInventory {
    pub ngo_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub batch_id: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

// ==========================================
// BoxNgoInfo - 物资箱所属 NGO
// ==========================================
// 对齐: box_ngo_info JOIN supply_boxes / ngos / flood_centers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxNgoInfo {
    pub box_id: i64,
    pub qr_code: String,
    pub ngo_id: i64,
    pub ngo_name: String,
    pub destination_center_id: Option<i64>,
    pub destination_center_name: Option<String>,
    pub priority: Priority,
    pub linked_at: NaiveDateTime,
}
