// ==========================================
// 洪灾物资调度系统 - 核销事务存储
// ==========================================
// 职责: 为一次扫码核销提供单事务数据访问
// 红线: 一次扫码的全部读写在同一个 IMMEDIATE 事务内完成
// 红线: 需求状态使用条件更新 (WHERE status = from)，保证同一需求至多核销一次
// ==========================================

use crate::domain::delivery::{NewDelivery, UnmatchedReceipt};
use crate::domain::demand::Demand;
use crate::domain::supply_box::{ManifestLine, SupplyBox};
use crate::domain::types::DemandStatus;
use crate::repository::box_repo::{query_box_by_code, query_manifest};
use crate::repository::delivery_repo::{insert_delivery, insert_unmatched};
use crate::repository::demand_repo::{query_demand_by_id, query_oldest_pending};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// ==========================================
// ScanStore - 事务内的数据访问
// ==========================================
// 实现者: SqliteScanScope（生产）/ 测试中的内存实现
pub trait ScanStore {
    /// 按箱码精确查找物资箱
    fn resolve_box_by_code(&self, code: &str) -> RepositoryResult<Option<SupplyBox>>;

    /// 加载装箱清单（按写入顺序）
    fn load_manifest(&self, box_id: i64) -> RepositoryResult<Vec<ManifestLine>>;

    /// 查找 (中心, 物资) 下最早的待处理需求
    fn find_oldest_pending_demand(
        &self,
        center_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<Demand>>;

    /// 写入签收记录
    ///
    /// # 返回
    /// - Ok(delivery_id)
    fn record_delivery(&self, delivery: &NewDelivery) -> RepositoryResult<i64>;

    /// 条件更新需求状态
    ///
    /// # 返回
    /// - Err(NotFound): 需求不存在
    /// - Err(InvalidStateTransition): 当前状态不是 `from`
    fn set_demand_status(
        &self,
        demand_id: i64,
        from: DemandStatus,
        to: DemandStatus,
    ) -> RepositoryResult<()>;

    /// 写入未核销签收行
    fn record_unmatched(&self, receipt: &UnmatchedReceipt) -> RepositoryResult<i64>;
}

// ==========================================
// ReconcileStore - 工作单元
// ==========================================
// `work` 返回 Ok 时提交，返回 Err 时回滚，回滚后不留下任何部分写入
pub trait ReconcileStore: Send + Sync {
    fn run_in_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&dyn ScanStore) -> RepositoryResult<T>;
}

impl<S: ReconcileStore> ReconcileStore for Arc<S> {
    fn run_in_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&dyn ScanStore) -> RepositoryResult<T>,
    {
        (**self).run_in_transaction(work)
    }
}

// ==========================================
// SqliteReconcileStore - SQLite 实现
// ==========================================
pub struct SqliteReconcileStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReconcileStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl ReconcileStore for SqliteReconcileStore {
    fn run_in_transaction<T, F>(&self, work: F) -> RepositoryResult<T>
    where
        F: FnOnce(&dyn ScanStore) -> RepositoryResult<T>,
    {
        let mut conn = self.get_conn()?;
        // IMMEDIATE: 事务开始即取得写锁，并发扫码按顺序串行化
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| match RepositoryError::from(e) {
                RepositoryError::LockError(msg) => RepositoryError::LockError(msg),
                other => RepositoryError::DatabaseTransactionError(other.to_string()),
            })?;

        let result = {
            let scope = SqliteScanScope { conn: &tx };
            work(&scope)
        };

        match result {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                debug!("核销事务已提交");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "核销事务回滚失败");
                }
                warn!(error = %err, "核销事务已回滚");
                Err(err)
            }
        }
    }
}

// ==========================================
// SqliteScanScope - 事务内视图
// ==========================================
pub struct SqliteScanScope<'a> {
    conn: &'a Connection,
}

impl ScanStore for SqliteScanScope<'_> {
    fn resolve_box_by_code(&self, code: &str) -> RepositoryResult<Option<SupplyBox>> {
        Ok(query_box_by_code(self.conn, code)?)
    }

    fn load_manifest(&self, box_id: i64) -> RepositoryResult<Vec<ManifestLine>> {
        Ok(query_manifest(self.conn, box_id)?)
    }

    fn find_oldest_pending_demand(
        &self,
        center_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<Demand>> {
        Ok(query_oldest_pending(self.conn, center_id, item_id)?)
    }

    fn record_delivery(&self, delivery: &NewDelivery) -> RepositoryResult<i64> {
        Ok(insert_delivery(self.conn, delivery)?)
    }

    fn set_demand_status(
        &self,
        demand_id: i64,
        from: DemandStatus,
        to: DemandStatus,
    ) -> RepositoryResult<()> {
        if !from.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                demand_id,
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let changed = self.conn.execute(
            "UPDATE supply_demands SET status = ?1 WHERE demand_id = ?2 AND status = ?3",
            params![to.to_db_str(), demand_id, from.to_db_str()],
        )?;

        if changed == 1 {
            return Ok(());
        }

        match query_demand_by_id(self.conn, demand_id)? {
            None => Err(RepositoryError::not_found("Demand", demand_id)),
            Some(current) => Err(RepositoryError::InvalidStateTransition {
                demand_id,
                from: current.status.to_string(),
                to: to.to_string(),
            }),
        }
    }

    fn record_unmatched(&self, receipt: &UnmatchedReceipt) -> RepositoryResult<i64> {
        Ok(insert_unmatched(self.conn, receipt)?)
    }
}
