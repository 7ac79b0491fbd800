// ==========================================
// 洪灾物资调度系统 - 扫码签收 API
// ==========================================
// 职责: 接收中心扫码入口，返回核销报告与本地化提示语
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::delivery::{Delivery, UnmatchedReceipt};
use crate::domain::types::ScanOutcome;
use crate::engine::reconcile::{ReconcileEngine, ScanReport};
use crate::i18n;
use crate::repository::delivery_repo::DeliveryRepository;
use crate::repository::reconcile_store::SqliteReconcileStore;

/// 扫码响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub outcome: ScanOutcome,
    /// 面向操作员的提示语（按 ui.locale）
    pub message: String,
    pub report: ScanReport,
}

// ==========================================
// ScanApi - 扫码签收 API
// ==========================================
pub struct ScanApi {
    store: Arc<SqliteReconcileStore>,
    delivery_repo: Arc<DeliveryRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ScanApi {
    pub fn new(
        store: Arc<SqliteReconcileStore>,
        delivery_repo: Arc<DeliveryRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            store,
            delivery_repo,
            config_manager,
        }
    }

    /// 扫码签收
    ///
    /// # 参数
    /// - code: 扫到的箱码（原样传入，不做 trim；空串同样按未找到处理）
    /// - center_id: 接收中心
    /// - received_by: 签收人
    ///
    /// # 返回
    /// - Ok(ScanResponse): outcome=NotFound 也属于正常返回
    /// - Err(ApiError): 存储失败（本次扫码无任何写入）
    pub fn scan_box(&self, code: &str, center_id: i64, received_by: &str) -> ApiResult<ScanResponse> {
        // 每次扫码读取最新开关，配置修改无需重启
        let config = self.config_manager.reconcile_config()?;
        let locale = self.config_manager.locale()?;

        let engine = ReconcileEngine::new(self.store.clone(), config);
        let report = engine.reconcile(code, center_id, received_by)?;

        let message = scan_message(&locale, code, &report);
        Ok(ScanResponse {
            outcome: report.outcome,
            message,
            report,
        })
    }

    // ===== 签收审计查询 =====

    /// 某箱产生的签收记录
    pub fn list_deliveries_for_box(&self, box_id: i64) -> ApiResult<Vec<Delivery>> {
        Ok(self.delivery_repo.list_by_box(box_id)?)
    }

    /// 满足某需求的签收记录
    pub fn find_delivery_for_demand(&self, demand_id: i64) -> ApiResult<Option<Delivery>> {
        Ok(self.delivery_repo.find_by_demand(demand_id)?)
    }

    /// 某箱的未核销签收行
    pub fn list_unmatched_for_box(&self, box_id: i64) -> ApiResult<Vec<UnmatchedReceipt>> {
        Ok(self.delivery_repo.list_unmatched_by_box(box_id)?)
    }
}

fn scan_message(locale: &str, code: &str, report: &ScanReport) -> String {
    match report.outcome {
        ScanOutcome::NotFound => i18n::t_in(locale, "scan.not_found", &[("code", code)]),
        ScanOutcome::Success if report.manifest.is_empty() => {
            i18n::t_in(locale, "scan.empty_manifest", &[("code", code)])
        }
        ScanOutcome::Success => {
            let matched = report.matched.len().to_string();
            let unmatched = report.unmatched.len().to_string();
            i18n::t_in(
                locale,
                "scan.success",
                &[
                    ("code", code),
                    ("matched", matched.as_str()),
                    ("unmatched", unmatched.as_str()),
                ],
            )
        }
    }
}
