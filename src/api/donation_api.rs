// ==========================================
// 洪灾物资调度系统 - 捐款 API
// ==========================================
// 职责: 记录捐款、分配用途、捐款人按邮箱追踪
// 红线: 只接受已审核 NGO；金额以分表示且为正
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::donation::{Donation, DonationTrack, NewDonation};
use crate::domain::types::VerificationStatus;
use crate::i18n;
use crate::repository::donation_repo::DonationRepository;
use crate::repository::ngo_repo::NgoRepository;

/// 捐款记录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationResponse {
    pub message: String,
    pub donation: Donation,
}

/// 邮箱统一 trim + 小写后存储与查询
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

pub struct DonationApi {
    donation_repo: Arc<DonationRepository>,
    ngo_repo: Arc<NgoRepository>,
    config_manager: Arc<ConfigManager>,
}

impl DonationApi {
    pub fn new(
        donation_repo: Arc<DonationRepository>,
        ngo_repo: Arc<NgoRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            donation_repo,
            ngo_repo,
            config_manager,
        }
    }

    /// 记录一笔捐款
    ///
    /// # 返回
    /// - Err(InvalidInput): 金额非正 / 捐款人或邮箱为空
    /// - Err(NotFound): NGO 不存在
    /// - Err(BusinessRuleViolation): NGO 未通过审核
    pub fn create_donation(&self, input: &NewDonation) -> ApiResult<DonationResponse> {
        if input.amount_cents <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "捐款金额必须为正: {}",
                input.amount_cents
            )));
        }
        if input.donor_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("捐款人姓名不能为空".to_string()));
        }
        let donor_email = normalize_email(&input.donor_email);
        if donor_email.is_empty() {
            return Err(ApiError::InvalidInput("捐款人邮箱不能为空".to_string()));
        }

        let ngo = self
            .ngo_repo
            .find_ngo(input.ngo_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Ngo(id={})不存在", input.ngo_id)))?;
        if ngo.verification_status != VerificationStatus::Verified {
            return Err(ApiError::BusinessRuleViolation(format!(
                "NGO {} 尚未通过审核（{}），不能接收捐款",
                ngo.ngo_id, ngo.verification_status
            )));
        }

        let normalized = NewDonation {
            donor_email,
            donor_name: input.donor_name.trim().to_string(),
            ..input.clone()
        };
        let now = chrono::Local::now().naive_local();
        let donation_id = self.donation_repo.insert_donation(&normalized, now)?;
        let donation = self
            .donation_repo
            .find_donation(donation_id)?
            .ok_or_else(|| ApiError::InternalError(format!("捐款{}写入后未找到", donation_id)))?;

        tracing::info!(donation_id, ngo_id = ngo.ngo_id, amount_cents = donation.amount_cents, "捐款已记录");

        let locale = self.config_manager.locale()?;
        let amount = format_amount(donation.amount_cents);
        let message = i18n::t_in(
            &locale,
            "donation.recorded",
            &[("amount", amount.as_str()), ("ngo", ngo.name.as_str())],
        );

        Ok(DonationResponse { message, donation })
    }

    /// 为捐款分配用途
    ///
    /// # 返回
    /// - Ok(allocation_id)
    /// - Err(BusinessRuleViolation): 分配总额超出捐款金额
    pub fn allocate_donation(
        &self,
        donation_id: i64,
        purpose: &str,
        amount_cents: i64,
    ) -> ApiResult<i64> {
        if amount_cents <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "分配金额必须为正: {}",
                amount_cents
            )));
        }
        if purpose.trim().is_empty() {
            return Err(ApiError::InvalidInput("分配用途不能为空".to_string()));
        }
        let now = chrono::Local::now().naive_local();
        let allocation_id =
            self.donation_repo
                .allocate(donation_id, purpose.trim(), amount_cents, now)?;
        tracing::info!(donation_id, allocation_id, amount_cents, "捐款已分配");
        Ok(allocation_id)
    }

    /// 捐款人按邮箱追踪自己的捐款（大小写、首尾空白不敏感）
    pub fn track_donation(&self, donor_email: &str) -> ApiResult<Vec<DonationTrack>> {
        let email = normalize_email(donor_email);
        if email.is_empty() {
            return Err(ApiError::InvalidInput("捐款人邮箱不能为空".to_string()));
        }
        Ok(self.donation_repo.track_by_email(&email)?)
    }
}
