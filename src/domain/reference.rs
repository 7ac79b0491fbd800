// ==========================================
// 洪灾物资调度系统 - 参考数据领域模型
// ==========================================
// 物资品类 / 安置中心 / 中心存量
// 红线: 参考数据独立维护，核销流程只读
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// SupplyItem - 物资品类
// ==========================================
// 对齐: supply_items 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyItem {
    pub item_id: i64,
    pub name: String,             // 品名
    pub category: Option<String>, // 类别 (Food & Water / Clothing / ...)
    pub unit: Option<String>,     // 计量单位
}

// ==========================================
// FloodCenter - 安置中心
// ==========================================
// 对齐: flood_centers 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloodCenter {
    pub center_id: i64,
    pub name: String,
    pub state: Option<String>,         // 所在州
    pub address: Option<String>,
    pub contact_phone: Option<String>,
}

/// 新建物资品类的输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplyItem {
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
}

/// 新建安置中心的输入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFloodCenter {
    pub name: String,
    pub state: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
}

// ==========================================
// CenterSupply - 中心物资存量登记
// ==========================================
// 对齐: supply_centers JOIN supply_items
// 每次登记追加一行，按日期保留历史
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterSupply {
    pub stock_id: i64,
    pub center_id: i64,
    pub item_id: i64,
    pub supply_type: Option<String>, // 物资品名
    pub quantity: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCenterSupply {
    pub center_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub date: NaiveDate,
}
