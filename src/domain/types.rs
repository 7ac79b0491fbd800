// ==========================================
// 洪灾物资调度系统 - 领域类型定义
// ==========================================
// 优先级 / 需求状态 / 签收结果
// 存储格式: 与 supply_demands / supply_boxes 表的文本列一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 优先级 (Priority)
// ==========================================
// 顺序: Critical > High > Medium > Low > Unspecified
// 只用于告警视图排序，不参与核销选单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Unspecified,
}

impl Priority {
    /// 告警排序序号（1 最高，5 最低）
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
            Priority::Unspecified => 5,
        }
    }

    /// 从数据库文本解析
    ///
    /// 未知值或 NULL 一律视为 Unspecified（排在最后）
    pub fn from_db_str(s: Option<&str>) -> Self {
        match s.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "critical" => Priority::Critical,
            Some(v) if v == "high" => Priority::High,
            Some(v) if v == "medium" => Priority::Medium,
            Some(v) if v == "low" => Priority::Low,
            _ => Priority::Unspecified,
        }
    }

    /// 转换为数据库存储的文本（Unspecified 存 NULL）
    pub fn to_db_str(&self) -> Option<&'static str> {
        match self {
            Priority::Critical => Some("Critical"),
            Priority::High => Some("High"),
            Priority::Medium => Some("Medium"),
            Priority::Low => Some("Low"),
            Priority::Unspecified => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "Critical"),
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
            Priority::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// ==========================================
// 需求状态 (Demand Status)
// ==========================================
// 单向: Pending -> Fulfilled，无取消、无部分满足
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemandStatus {
    Pending,
    Fulfilled,
}

impl DemandStatus {
    /// 精确匹配，与 SQL 中的 `status = 'Pending'` 过滤保持一致
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(DemandStatus::Pending),
            "Fulfilled" => Some(DemandStatus::Fulfilled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DemandStatus::Pending => "Pending",
            DemandStatus::Fulfilled => "Fulfilled",
        }
    }

    /// 状态转换是否合法
    ///
    /// 相同状态的写入视为幂等（允许）；Fulfilled 不可回退
    pub fn can_transition_to(&self, next: DemandStatus) -> bool {
        !matches!((self, next), (DemandStatus::Fulfilled, DemandStatus::Pending))
    }
}

impl fmt::Display for DemandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// NGO 审核状态 (Verification Status)
// ==========================================
// 只有 Verified 的 NGO 出现在公开列表并可接收捐款
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(VerificationStatus::Pending),
            "Verified" => Some(VerificationStatus::Verified),
            "Rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Pending",
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 未核销原因 (Unmatched Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnmatchedReason {
    /// 接收中心没有该物资的待处理需求
    NoPendingDemand,
    /// 严格模式下箱内数量不足以满足最早需求
    QuantityShortfall,
}

impl UnmatchedReason {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UnmatchedReason::NoPendingDemand => "NO_PENDING_DEMAND",
            UnmatchedReason::QuantityShortfall => "QUANTITY_SHORTFALL",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "QUANTITY_SHORTFALL" => UnmatchedReason::QuantityShortfall,
            _ => UnmatchedReason::NoPendingDemand,
        }
    }
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 扫码结果 (Scan Outcome)
// ==========================================
// 部分核销与全部核销不作区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Success,
    NotFound,
}
