// ==========================================
// 洪灾物资调度系统 - 签收审计数据仓储
// ==========================================
// 表: supply_deliveries / unmatched_receipts
// 红线: 审计记录只追加，本仓储不提供更新/删除
// ==========================================

use crate::domain::delivery::{Delivery, NewDelivery, UnmatchedReceipt};
use crate::domain::types::UnmatchedReason;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DELIVERY_COLUMNS: &str =
    "delivery_id, box_id, demand_id, center_id, delivery_date, received_by";

const UNMATCHED_COLUMNS: &str =
    "receipt_id, box_id, item_id, quantity, center_id, received_at, received_by, reason";

fn map_delivery_row(row: &Row<'_>) -> rusqlite::Result<Delivery> {
    Ok(Delivery {
        delivery_id: row.get(0)?,
        box_id: row.get(1)?,
        demand_id: row.get(2)?,
        center_id: row.get(3)?,
        delivery_date: row.get(4)?,
        received_by: row.get(5)?,
    })
}

fn map_unmatched_row(row: &Row<'_>) -> rusqlite::Result<UnmatchedReceipt> {
    let reason: String = row.get(7)?;
    Ok(UnmatchedReceipt {
        receipt_id: row.get(0)?,
        box_id: row.get(1)?,
        item_id: row.get(2)?,
        quantity: row.get(3)?,
        center_id: row.get(4)?,
        received_at: row.get(5)?,
        received_by: row.get(6)?,
        reason: UnmatchedReason::from_db_str(&reason),
    })
}

/// 写入签收记录（供核销事务使用）
pub(crate) fn insert_delivery(conn: &Connection, delivery: &NewDelivery) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO supply_deliveries (box_id, demand_id, center_id, delivery_date, received_by)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            delivery.box_id,
            delivery.demand_id,
            delivery.center_id,
            delivery.delivery_date,
            delivery.received_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// 写入未核销签收行（供核销事务使用）
pub(crate) fn insert_unmatched(conn: &Connection, receipt: &UnmatchedReceipt) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO unmatched_receipts
            (box_id, item_id, quantity, center_id, received_at, received_by, reason)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            receipt.box_id,
            receipt.item_id,
            receipt.quantity,
            receipt.center_id,
            receipt.received_at,
            receipt.received_by,
            receipt.reason.to_db_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ==========================================
// DeliveryRepository - 签收审计仓储（只读查询）
// ==========================================
pub struct DeliveryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeliveryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询某箱产生的签收记录（按写入顺序）
    pub fn list_by_box(&self, box_id: i64) -> RepositoryResult<Vec<Delivery>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM supply_deliveries WHERE box_id = ?1 ORDER BY delivery_id",
            DELIVERY_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![box_id], map_delivery_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询满足某需求的签收记录（至多一条）
    pub fn find_by_demand(&self, demand_id: i64) -> RepositoryResult<Option<Delivery>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {} FROM supply_deliveries WHERE demand_id = ?1",
                    DELIVERY_COLUMNS
                ),
                params![demand_id],
                map_delivery_row,
            )
            .optional()?;
        Ok(found)
    }

    /// 签收记录总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM supply_deliveries", [], |row| row.get(0))?;
        Ok(n)
    }

    /// 查询某箱的未核销签收行
    pub fn list_unmatched_by_box(&self, box_id: i64) -> RepositoryResult<Vec<UnmatchedReceipt>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM unmatched_receipts WHERE box_id = ?1 ORDER BY receipt_id",
            UNMATCHED_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![box_id], map_unmatched_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
