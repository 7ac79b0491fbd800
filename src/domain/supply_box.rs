// ==========================================
// 洪灾物资调度系统 - 物资箱领域模型
// ==========================================
// 箱 (SupplyBox) + 装箱清单 (ManifestLine)
// 红线: 箱码全局唯一、生成一次、永不复用
// 红线: 清单在装箱时写入，之后不可变
// ==========================================

use crate::domain::types::Priority;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SupplyBox - 物资箱
// ==========================================
// 对齐: supply_boxes 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyBox {
    pub box_id: i64,
    pub qr_code: String,                     // 箱码（不透明字符串，按字节精确匹配）
    pub created_at: NaiveDateTime,
    pub destination_center_id: Option<i64>,  // 目的安置中心
    pub priority: Priority,                  // 装箱时标注的优先级
}

// ==========================================
// ManifestLine - 装箱清单行
// ==========================================
// 对齐: box_contents 表 JOIN supply_items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestLine {
    pub content_id: i64,
    pub box_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: i64, // 正整数
}

/// 装箱输入行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackLine {
    pub item_id: i64,
    pub quantity: i64,
}

/// 装箱结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedBox {
    pub supply_box: SupplyBox,
    pub manifest: Vec<ManifestLine>,
}
