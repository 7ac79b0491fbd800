// ==========================================
// 洪灾物资调度系统 - NGO API
// ==========================================
// 职责: NGO 登记与审核、库存入库、物资箱归属
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::ngo::{BoxNgoInfo, NewNgo, NewNgoInventory, Ngo, NgoInventoryEntry};
use crate::domain::types::VerificationStatus;
use crate::repository::ngo_repo::NgoRepository;

pub struct NgoApi {
    ngo_repo: Arc<NgoRepository>,
}

impl NgoApi {
    pub fn new(ngo_repo: Arc<NgoRepository>) -> Self {
        Self { ngo_repo }
    }

    /// 登记 NGO（名称不能为空，初始状态 Pending）
    pub fn register_ngo(&self, ngo: &NewNgo) -> ApiResult<i64> {
        if ngo.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("NGO 名称不能为空".to_string()));
        }
        let ngo_id = self.ngo_repo.insert_ngo(ngo)?;
        tracing::info!(ngo_id, name = %ngo.name, "NGO 已登记");
        Ok(ngo_id)
    }

    pub fn set_verification(&self, ngo_id: i64, status: VerificationStatus) -> ApiResult<()> {
        self.ngo_repo.set_verification(ngo_id, status)?;
        tracing::info!(ngo_id, %status, "NGO 审核状态已更新");
        Ok(())
    }

    pub fn get_ngo(&self, ngo_id: i64) -> ApiResult<Ngo> {
        self.ngo_repo
            .find_ngo(ngo_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Ngo(id={})不存在", ngo_id)))
    }

    /// 已通过审核的 NGO（捐款页面可选列表）
    pub fn list_verified_ngos(&self) -> ApiResult<Vec<Ngo>> {
        Ok(self.ngo_repo.list_by_status(VerificationStatus::Verified)?)
    }

    /// 库存入库
    ///
    /// # 返回
    /// - Ok(inventory_id)
    /// - Err(InvalidInput): 数量非正
    /// - Err(NotFound): NGO 不存在
    /// - Err(BusinessRuleViolation): 物资品类不存在
    pub fn add_inventory(&self, entry: &NewNgoInventory) -> ApiResult<i64> {
        if entry.quantity <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "入库数量必须为正: {}",
                entry.quantity
            )));
        }
        self.get_ngo(entry.ngo_id)?;

        let now = chrono::Local::now().naive_local();
        let inventory_id = self.ngo_repo.insert_inventory(entry, now)?;
        tracing::info!(
            inventory_id,
            ngo_id = entry.ngo_id,
            item_id = entry.item_id,
            quantity = entry.quantity,
            "NGO 库存已入库"
        );
        Ok(inventory_id)
    }

    pub fn list_inventory(&self, ngo_id: i64) -> ApiResult<Vec<NgoInventoryEntry>> {
        self.get_ngo(ngo_id)?;
        Ok(self.ngo_repo.list_inventory(ngo_id)?)
    }

    /// 关联物资箱与 NGO
    ///
    /// 箱已关联过时返回 BusinessRuleViolation
    pub fn link_box(&self, box_id: i64, ngo_id: i64) -> ApiResult<BoxNgoInfo> {
        self.get_ngo(ngo_id)?;
        let now = chrono::Local::now().naive_local();
        self.ngo_repo.link_box(box_id, ngo_id, now)?;
        tracing::info!(box_id, ngo_id, "物资箱已关联 NGO");
        self.get_box_ngo_info(box_id)
    }

    pub fn get_box_ngo_info(&self, box_id: i64) -> ApiResult<BoxNgoInfo> {
        self.ngo_repo
            .find_box_info(box_id)?
            .ok_or_else(|| ApiError::NotFound(format!("物资箱{}未关联 NGO", box_id)))
    }
}
