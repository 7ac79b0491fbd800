// ==========================================
// 洪灾物资调度系统 - 参考数据 API
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::reference::{
    CenterSupply, FloodCenter, NewCenterSupply, NewFloodCenter, NewSupplyItem, SupplyItem,
};
use crate::repository::center_stock_repo::CenterStockRepository;
use crate::repository::reference_repo::ReferenceDataRepository;

pub struct ReferenceDataApi {
    reference_repo: Arc<ReferenceDataRepository>,
    stock_repo: Arc<CenterStockRepository>,
}

impl ReferenceDataApi {
    pub fn new(
        reference_repo: Arc<ReferenceDataRepository>,
        stock_repo: Arc<CenterStockRepository>,
    ) -> Self {
        Self {
            reference_repo,
            stock_repo,
        }
    }

    /// 登记物资品类（品名不能为空）
    pub fn register_item(&self, item: &NewSupplyItem) -> ApiResult<i64> {
        if item.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("物资品名不能为空".to_string()));
        }
        Ok(self.reference_repo.insert_item(item)?)
    }

    pub fn list_items(&self) -> ApiResult<Vec<SupplyItem>> {
        Ok(self.reference_repo.list_items()?)
    }

    pub fn get_item(&self, item_id: i64) -> ApiResult<SupplyItem> {
        self.reference_repo
            .find_item(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("SupplyItem(id={})不存在", item_id)))
    }

    /// 登记安置中心（名称不能为空）
    pub fn register_center(&self, center: &NewFloodCenter) -> ApiResult<i64> {
        if center.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("安置中心名称不能为空".to_string()));
        }
        Ok(self.reference_repo.insert_center(center)?)
    }

    pub fn list_centers(&self) -> ApiResult<Vec<FloodCenter>> {
        Ok(self.reference_repo.list_centers()?)
    }

    pub fn get_center(&self, center_id: i64) -> ApiResult<FloodCenter> {
        self.reference_repo
            .find_center(center_id)?
            .ok_or_else(|| ApiError::NotFound(format!("FloodCenter(id={})不存在", center_id)))
    }

    /// 删除安置中心
    ///
    /// 存量登记随之删除；需求单无外键，保留原样。
    ///
    /// # 返回
    /// - Err(NotFound): 中心不存在
    /// - Err(BusinessRuleViolation): 仍有物资箱以该中心为目的地
    pub fn remove_center(&self, center_id: i64) -> ApiResult<()> {
        self.reference_repo.delete_center(center_id)?;
        tracing::info!(center_id, "安置中心已删除");
        Ok(())
    }

    /// 登记中心物资存量（数量不能为负）
    pub fn record_center_supply(&self, stock: &NewCenterSupply) -> ApiResult<i64> {
        if stock.quantity < 0 {
            return Err(ApiError::InvalidInput(format!(
                "存量不能为负: {}",
                stock.quantity
            )));
        }
        self.get_center(stock.center_id)?;
        Ok(self.stock_repo.insert_stock(stock)?)
    }

    /// 某中心的存量登记历史（最新在前）
    pub fn supplies_for_center(&self, center_id: i64) -> ApiResult<Vec<CenterSupply>> {
        self.get_center(center_id)?;
        Ok(self.stock_repo.list_for_center(center_id)?)
    }
}
