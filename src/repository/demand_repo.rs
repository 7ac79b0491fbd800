// ==========================================
// 洪灾物资调度系统 - 需求单数据仓储
// ==========================================
// 表: supply_demands（展示字段 LEFT JOIN flood_centers / supply_items）
// 红线: Repository 不含业务逻辑（告警排序在 engine::DemandRanker）
// ==========================================

use crate::domain::demand::{Demand, DemandView, NewDemand};
use crate::domain::types::{DemandStatus, Priority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DEMAND_COLUMNS: &str =
    "sd.demand_id, sd.center_id, sd.item_id, sd.quantity, sd.priority, sd.request_date, sd.status";

pub(crate) fn map_demand_row(row: &Row<'_>) -> rusqlite::Result<Demand> {
    let priority: Option<String> = row.get(4)?;
    let status_raw: String = row.get(6)?;
    let status = DemandStatus::from_db_str(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("未知需求状态: {}", status_raw).into(),
        )
    })?;

    Ok(Demand {
        demand_id: row.get(0)?,
        center_id: row.get(1)?,
        item_id: row.get(2)?,
        quantity: row.get(3)?,
        priority: Priority::from_db_str(priority.as_deref()),
        request_date: row.get(5)?,
        status,
    })
}

fn map_view_row(row: &Row<'_>) -> rusqlite::Result<DemandView> {
    Ok(DemandView {
        demand: map_demand_row(row)?,
        center_name: row.get(7)?,
        item_name: row.get(8)?,
    })
}

fn view_select() -> String {
    format!(
        r#"
        SELECT {}, fc.name, si.name
        FROM supply_demands sd
        LEFT JOIN flood_centers fc ON sd.center_id = fc.center_id
        LEFT JOIN supply_items si ON sd.item_id = si.item_id
        "#,
        DEMAND_COLUMNS
    )
}

/// 查询 (中心, 物资) 下最早的待处理需求
///
/// 排序: request_date 升序，同一时间取 demand_id 最小者；与优先级无关
pub(crate) fn query_oldest_pending(
    conn: &Connection,
    center_id: i64,
    item_id: i64,
) -> rusqlite::Result<Option<Demand>> {
    conn.query_row(
        &format!(
            r#"
            SELECT {}
            FROM supply_demands sd
            WHERE sd.center_id = ?1 AND sd.item_id = ?2 AND sd.status = 'Pending'
            ORDER BY sd.request_date ASC, sd.demand_id ASC
            LIMIT 1
            "#,
            DEMAND_COLUMNS
        ),
        params![center_id, item_id],
        map_demand_row,
    )
    .optional()
}

pub(crate) fn query_demand_by_id(conn: &Connection, demand_id: i64) -> rusqlite::Result<Option<Demand>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM supply_demands sd WHERE sd.demand_id = ?1",
            DEMAND_COLUMNS
        ),
        params![demand_id],
        map_demand_row,
    )
    .optional()
}

// ==========================================
// DemandRepository - 需求单仓储
// ==========================================
pub struct DemandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemandRepository {
    /// 创建新的需求单仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建需求单（状态固定为 Pending）
    ///
    /// 不校验数量正负、中心/物资是否存在
    ///
    /// # 返回
    /// - Ok(demand_id)
    pub fn create(&self, demand: &NewDemand) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let request_date = demand
            .request_date
            .unwrap_or_else(|| chrono::Local::now().naive_local());

        conn.execute(
            r#"
            INSERT INTO supply_demands (center_id, item_id, quantity, priority, request_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                demand.center_id,
                demand.item_id,
                demand.quantity,
                demand.priority.to_db_str(),
                request_date,
                DemandStatus::Pending.to_db_str(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按 demand_id 查询
    pub fn find_by_id(&self, demand_id: i64) -> RepositoryResult<Option<Demand>> {
        let conn = self.get_conn()?;
        Ok(query_demand_by_id(&conn, demand_id)?)
    }

    /// 更新需求状态（按 demand_id 显式定位）
    ///
    /// # 返回
    /// - Ok(()): 更新成功（相同状态写入视为成功）
    /// - Err(NotFound): 需求不存在
    /// - Err(InvalidStateTransition): Fulfilled 不可回退为 Pending
    pub fn update_status(&self, demand_id: i64, status: DemandStatus) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let current = query_demand_by_id(&tx, demand_id)?
            .ok_or_else(|| RepositoryError::not_found("Demand", demand_id))?;

        if !current.status.can_transition_to(status) {
            return Err(RepositoryError::InvalidStateTransition {
                demand_id,
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        tx.execute(
            "UPDATE supply_demands SET status = ?1 WHERE demand_id = ?2",
            params![status.to_db_str(), demand_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// 查询 (中心, 物资) 下最早的待处理需求
    pub fn find_oldest_pending(
        &self,
        center_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<Demand>> {
        let conn = self.get_conn()?;
        Ok(query_oldest_pending(&conn, center_id, item_id)?)
    }

    /// 查询全部待处理需求（带展示字段，未排序语义）
    ///
    /// 告警排序由 `DemandRanker` 完成
    pub fn list_pending(&self) -> RepositoryResult<Vec<DemandView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE sd.status = 'Pending' ORDER BY sd.demand_id",
            view_select()
        ))?;
        let rows = stmt
            .query_map([], map_view_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询指定中心的全部需求（新需求在前）
    pub fn list_by_center(&self, center_id: i64) -> RepositoryResult<Vec<DemandView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE sd.center_id = ?1 ORDER BY sd.request_date DESC, sd.demand_id DESC",
            view_select()
        ))?;
        let rows = stmt
            .query_map(params![center_id], map_view_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按中心过滤的待处理需求（新需求在前）
    ///
    /// # 参数
    /// - center_ids: 中心列表（空列表表示不过滤）
    pub fn list_pending_for_centers(&self, center_ids: &[i64]) -> RepositoryResult<Vec<DemandView>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE sd.status = 'Pending'", view_select());
        if !center_ids.is_empty() {
            let placeholders = vec!["?"; center_ids.len()].join(",");
            sql.push_str(&format!(" AND sd.center_id IN ({})", placeholders));
        }
        sql.push_str(" ORDER BY sd.request_date DESC, sd.demand_id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(center_ids.iter()), map_view_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
