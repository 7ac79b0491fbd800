// ==========================================
// 洪灾物资调度系统 - 签收审计领域模型
// ==========================================
// Delivery: 核销成功的审计记录（只追加，不更新不删除）
// UnmatchedReceipt: 未能核销的签收行审计记录
// ==========================================

use crate::domain::types::UnmatchedReason;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Delivery - 签收记录
// ==========================================
// 对齐: supply_deliveries 表
// 红线: 引用的需求在记录前一刻必须为 Pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub delivery_id: i64,
    pub box_id: i64,
    pub demand_id: i64,
    pub center_id: i64,
    pub delivery_date: NaiveDateTime,
    pub received_by: String,
}

/// 待写入的签收记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDelivery {
    pub box_id: i64,
    pub demand_id: i64,
    pub center_id: i64,
    pub delivery_date: NaiveDateTime,
    pub received_by: String,
}

// ==========================================
// UnmatchedReceipt - 未核销签收行
// ==========================================
// 对齐: unmatched_receipts 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedReceipt {
    pub receipt_id: Option<i64>, // 写入前为 None
    pub box_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub center_id: i64,
    pub received_at: NaiveDateTime,
    pub received_by: String,
    pub reason: UnmatchedReason,
}
