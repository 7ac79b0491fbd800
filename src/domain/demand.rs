// ==========================================
// 洪灾物资调度系统 - 需求单领域模型
// ==========================================
// 需求单属于唯一中心、引用唯一物资
// 状态单向: Pending -> Fulfilled
// ==========================================

use crate::domain::types::{DemandStatus, Priority};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Demand - 需求单
// ==========================================
// 对齐: supply_demands 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub demand_id: i64,
    pub center_id: i64,
    pub item_id: i64,
    pub quantity: i64,             // 请求数量（不校验正负，由调用方保证）
    pub priority: Priority,
    pub request_date: NaiveDateTime,
    pub status: DemandStatus,
}

/// 新建需求单的输入
///
/// `request_date` 为空时由仓储写入当前时间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDemand {
    pub center_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub priority: Priority,
    pub request_date: Option<NaiveDateTime>,
}

// ==========================================
// DemandView - 带展示字段的需求单
// ==========================================
// 用途: 告警列表 / 中心需求列表
// 中心或物资可能不存在（需求单无外键），展示字段为可选
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandView {
    pub demand: Demand,
    pub center_name: Option<String>,
    pub item_name: Option<String>,
}
