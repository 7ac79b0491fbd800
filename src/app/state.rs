// ==========================================
// 洪灾物资调度系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{DemandApi, DonationApi, NgoApi, PackingApi, ReferenceDataApi, ScanApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_shared_connection;
use crate::repository::{
    box_repo::SupplyBoxRepository, center_stock_repo::CenterStockRepository,
    delivery_repo::DeliveryRepository, demand_repo::DemandRepository,
    donation_repo::DonationRepository, ngo_repo::NgoRepository,
    reconcile_store::SqliteReconcileStore, reference_repo::ReferenceDataRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "FLOOD_RELIEF_DB";

/// 应用状态
///
/// 所有仓储共享同一个连接句柄
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 扫码签收API
    pub scan_api: Arc<ScanApi>,

    /// 需求单API
    pub demand_api: Arc<DemandApi>,

    /// 装箱API
    pub packing_api: Arc<PackingApi>,

    /// 参考数据API（含中心存量）
    pub reference_api: Arc<ReferenceDataApi>,

    /// NGO API
    pub ngo_api: Arc<NgoApi>,

    /// 捐款API
    pub donation_api: Arc<DonationApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时创建并执行迁移）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        Ok(Self::from_connection(db_path, conn))
    }

    /// 从已打开（已迁移）的连接构造
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Self {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let box_repo = Arc::new(SupplyBoxRepository::new(conn.clone()));
        let demand_repo = Arc::new(DemandRepository::new(conn.clone()));
        let delivery_repo = Arc::new(DeliveryRepository::new(conn.clone()));
        let reference_repo = Arc::new(ReferenceDataRepository::new(conn.clone()));
        let stock_repo = Arc::new(CenterStockRepository::new(conn.clone()));
        let ngo_repo = Arc::new(NgoRepository::new(conn.clone()));
        let donation_repo = Arc::new(DonationRepository::new(conn.clone()));
        let reconcile_store = Arc::new(SqliteReconcileStore::new(conn.clone()));

        let config_manager = Arc::new(ConfigManager::new(conn.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let scan_api = Arc::new(ScanApi::new(
            reconcile_store,
            delivery_repo,
            config_manager.clone(),
        ));
        let demand_api = Arc::new(DemandApi::new(demand_repo, config_manager.clone()));
        let packing_api = Arc::new(PackingApi::new(box_repo, config_manager.clone()));
        let reference_api = Arc::new(ReferenceDataApi::new(reference_repo, stock_repo));
        let ngo_api = Arc::new(NgoApi::new(ngo_repo.clone()));
        let donation_api = Arc::new(DonationApi::new(
            donation_repo,
            ngo_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Self {
            db_path,
            scan_api,
            demand_api,
            packing_api,
            reference_api,
            ngo_api,
            donation_api,
            config_manager,
            conn,
        }
    }

    /// 共享连接句柄（种子数据等工具使用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

/// 获取默认数据库路径
///
/// 顺序: FLOOD_RELIEF_DB 环境变量 > 用户本地数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./flood_relief.db");

    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("flood-relief-logistics");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("flood_relief.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 解析数据库路径：命令行参数优先
pub fn resolve_db_path(cli_arg: Option<&str>) -> String {
    match cli_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(p) => p.to_string(),
        None => get_default_db_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        assert_eq!(resolve_db_path(Some(" /tmp/x.db ")), "/tmp/x.db");
        assert!(!resolve_db_path(None).is_empty());
        assert!(!resolve_db_path(Some("  ")).is_empty());
    }
}
