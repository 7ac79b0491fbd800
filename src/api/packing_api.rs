// ==========================================
// 洪灾物资调度系统 - 装箱 API
// ==========================================
// 职责: 生成箱码、写入箱与清单
// 红线: 箱码为新生成的 UUID v4，从不复用
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::supply_box::{PackLine, PackedBox};
use crate::domain::types::Priority;
use crate::i18n;
use crate::repository::box_repo::SupplyBoxRepository;

/// 装箱响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackResponse {
    pub message: String,
    pub packed: PackedBox,
}

pub struct PackingApi {
    box_repo: Arc<SupplyBoxRepository>,
    config_manager: Arc<ConfigManager>,
}

impl PackingApi {
    pub fn new(box_repo: Arc<SupplyBoxRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            box_repo,
            config_manager,
        }
    }

    /// 装箱
    ///
    /// # 参数
    /// - destination_center_id: 目的中心
    /// - priority: 箱的优先级标注
    /// - lines: 清单行（允许为空；数量必须为正）
    ///
    /// # 返回
    /// - Ok(PackResponse): 含新箱码与清单
    /// - Err(InvalidInput): 存在非正数量
    pub fn pack_box(
        &self,
        destination_center_id: Option<i64>,
        priority: Priority,
        lines: &[PackLine],
    ) -> ApiResult<PackResponse> {
        if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
            return Err(ApiError::InvalidInput(format!(
                "物资{}的装箱数量必须为正: {}",
                bad.item_id, bad.quantity
            )));
        }

        let qr_code = Uuid::new_v4().to_string();
        let now = chrono::Local::now().naive_local();
        let packed = self.box_repo.create_with_manifest(
            &qr_code,
            now,
            destination_center_id,
            priority,
            lines,
        )?;

        tracing::info!(
            box_id = packed.supply_box.box_id,
            qr_code = %qr_code,
            lines = packed.manifest.len(),
            "物资箱已装箱"
        );

        let locale = self.config_manager.locale()?;
        let line_count = packed.manifest.len().to_string();
        let message = i18n::t_in(
            &locale,
            "pack.created",
            &[("code", qr_code.as_str()), ("lines", line_count.as_str())],
        );

        Ok(PackResponse { message, packed })
    }

    /// 按箱码查看箱与清单
    pub fn get_box(&self, qr_code: &str) -> ApiResult<PackedBox> {
        let supply_box = self
            .box_repo
            .find_by_code(qr_code)?
            .ok_or_else(|| ApiError::NotFound(format!("SupplyBox(code={})不存在", qr_code)))?;
        let manifest = self.box_repo.load_manifest(supply_box.box_id)?;
        Ok(PackedBox {
            supply_box,
            manifest,
        })
    }
}
