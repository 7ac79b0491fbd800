// ==========================================
// 洪灾物资调度系统 - 安置中心存量仓储
// ==========================================
// 表: supply_centers
// 只追加，不更新历史行
// ==========================================

use crate::domain::reference::{CenterSupply, NewCenterSupply};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_stock_row(row: &Row<'_>) -> rusqlite::Result<CenterSupply> {
    Ok(CenterSupply {
        stock_id: row.get(0)?,
        center_id: row.get(1)?,
        item_id: row.get(2)?,
        supply_type: row.get(3)?,
        quantity: row.get(4)?,
        date: row.get(5)?,
    })
}

pub struct CenterStockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CenterStockRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记一条中心存量
    ///
    /// 中心 / 物资不存在时返回 ForeignKeyViolation
    pub fn insert_stock(&self, stock: &NewCenterSupply) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO supply_centers (center_id, item_id, quantity, date) VALUES (?1, ?2, ?3, ?4)",
            params![stock.center_id, stock.item_id, stock.quantity, stock.date],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 某中心的存量登记（最新日期在前）
    pub fn list_for_center(&self, center_id: i64) -> RepositoryResult<Vec<CenterSupply>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sc.stock_id, sc.center_id, sc.item_id, si.name, sc.quantity, sc.date
            FROM supply_centers sc
            LEFT JOIN supply_items si ON sc.item_id = si.item_id
            WHERE sc.center_id = ?1
            ORDER BY sc.date DESC, sc.stock_id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![center_id], map_stock_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
