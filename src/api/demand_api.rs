// ==========================================
// 洪灾物资调度系统 - 需求单 API
// ==========================================
// 职责: 需求单创建、状态维护、告警视图、中心需求视图
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::demand::{Demand, DemandView, NewDemand};
use crate::domain::types::{DemandStatus, Priority};
use crate::engine::ranking::DemandRanker;
use crate::i18n;
use crate::repository::demand_repo::DemandRepository;

/// 告警视图响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAlerts {
    pub message: String,
    pub demands: Vec<DemandView>,
}

// ==========================================
// DemandApi - 需求单 API
// ==========================================
pub struct DemandApi {
    demand_repo: Arc<DemandRepository>,
    config_manager: Arc<ConfigManager>,
    ranker: DemandRanker,
}

impl DemandApi {
    pub fn new(demand_repo: Arc<DemandRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            demand_repo,
            config_manager,
            ranker: DemandRanker::new(),
        }
    }

    /// 新建需求单
    ///
    /// 数量、中心、物资均不做校验；状态固定为 Pending，时间取当前时间
    ///
    /// # 返回
    /// - Ok(demand_id)
    pub fn create_demand(
        &self,
        center_id: i64,
        item_id: i64,
        quantity: i64,
        priority: Priority,
    ) -> ApiResult<i64> {
        let demand_id = self.demand_repo.create(&NewDemand {
            center_id,
            item_id,
            quantity,
            priority,
            request_date: None,
        })?;

        tracing::info!(demand_id, center_id, item_id, quantity, %priority, "需求单已创建");
        Ok(demand_id)
    }

    /// 更新需求状态
    ///
    /// # 返回
    /// - Err(NotFound): 需求不存在
    /// - Err(InvalidStateTransition): Fulfilled 不可回退
    pub fn update_demand_status(&self, demand_id: i64, status: DemandStatus) -> ApiResult<()> {
        self.demand_repo.update_status(demand_id, status)?;
        tracing::info!(demand_id, %status, "需求状态已更新");
        Ok(())
    }

    pub fn get_demand(&self, demand_id: i64) -> ApiResult<Demand> {
        self.demand_repo
            .find_by_id(demand_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Demand(id={})不存在", demand_id)))
    }

    /// 全部待处理需求，按告警顺序排列
    pub fn list_pending_ranked(&self) -> ApiResult<Vec<DemandView>> {
        let pending = self.demand_repo.list_pending()?;
        Ok(self.ranker.rank(pending))
    }

    /// 告警视图（排序后的待处理需求 + 本地化摘要）
    pub fn pending_alerts(&self) -> ApiResult<PendingAlerts> {
        let demands = self.list_pending_ranked()?;
        let locale = self.config_manager.locale()?;

        let message = if demands.is_empty() {
            i18n::t_in(&locale, "alert.none_pending", &[])
        } else {
            let count = demands.len().to_string();
            i18n::t_in(&locale, "alert.pending_count", &[("count", count.as_str())])
        };

        Ok(PendingAlerts { message, demands })
    }

    /// 某中心的全部需求（新需求在前）
    pub fn list_center_demands(&self, center_id: i64) -> ApiResult<Vec<DemandView>> {
        Ok(self.demand_repo.list_by_center(center_id)?)
    }

    /// 新需求视图：按中心与优先级过滤的待处理需求（新需求在前）
    ///
    /// # 参数
    /// - center_ids: 中心过滤（空表示全部）
    /// - priorities: 优先级过滤（空表示全部）
    pub fn list_new_demands(
        &self,
        center_ids: &[i64],
        priorities: &[Priority],
    ) -> ApiResult<Vec<DemandView>> {
        let rows = self.demand_repo.list_pending_for_centers(center_ids)?;
        if priorities.is_empty() {
            return Ok(rows);
        }
        Ok(rows
            .into_iter()
            .filter(|v| priorities.contains(&v.demand.priority))
            .collect())
    }
}
