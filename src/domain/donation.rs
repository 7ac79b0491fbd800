// ==========================================
// 洪灾物资调度系统 - 捐款领域模型
// ==========================================
// 金额一律以分（i64）表示
// 红线: 同一笔捐款的分配总额不超过捐款金额
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Donation - 捐款
// ==========================================
// 对齐: donations 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub donation_id: i64,
    pub ngo_id: i64,
    pub donor_name: String,
    pub donor_email: String, // 存储前已规范化（trim + 小写）
    pub amount_cents: i64,
    pub donation_date: NaiveDateTime,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDonation {
    pub ngo_id: i64,
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    pub payment_method: Option<String>,
}

// ==========================================
// DonationAllocation - 捐款用途分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationAllocation {
    pub allocation_id: i64,
    pub donation_id: i64,
    pub purpose: String,
    pub amount_cents: i64,
    pub allocation_date: NaiveDateTime,
}

// ==========================================
// DonationTrack - 捐款追踪视图
// ==========================================
// 捐款人按邮箱查询自己的捐款去向
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationTrack {
    pub donation: Donation,
    pub ngo_name: Option<String>,
    pub allocations: Vec<DonationAllocation>,
}

impl DonationTrack {
    /// 尚未分配的金额
    pub fn unallocated_cents(&self) -> i64 {
        let allocated: i64 = self.allocations.iter().map(|a| a.amount_cents).sum();
        self.donation.amount_cents - allocated
    }
}
