// ==========================================
// 洪灾物资调度系统 - 物资箱数据仓储
// ==========================================
// 表: supply_boxes / box_contents
// 红线: Repository 不含业务逻辑
// 红线: 箱码按字节精确匹配（区分大小写，不做 trim）
// ==========================================

use crate::domain::supply_box::{ManifestLine, PackLine, PackedBox, SupplyBox};
use crate::domain::types::Priority;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const BOX_COLUMNS: &str = "box_id, qr_code, created_at, destination_center_id, priority";

pub(crate) fn map_box_row(row: &Row<'_>) -> rusqlite::Result<SupplyBox> {
    let priority: Option<String> = row.get(4)?;
    Ok(SupplyBox {
        box_id: row.get(0)?,
        qr_code: row.get(1)?,
        created_at: row.get(2)?,
        destination_center_id: row.get(3)?,
        priority: Priority::from_db_str(priority.as_deref()),
    })
}

/// 按箱码查询（供仓储与核销事务共用）
pub(crate) fn query_box_by_code(conn: &Connection, code: &str) -> rusqlite::Result<Option<SupplyBox>> {
    // `=` 在 SQLite 默认 BINARY 排序规则下逐字节比较
    conn.query_row(
        &format!("SELECT {} FROM supply_boxes WHERE qr_code = ?1", BOX_COLUMNS),
        params![code],
        map_box_row,
    )
    .optional()
}

/// 按插入顺序加载装箱清单（供仓储与核销事务共用）
pub(crate) fn query_manifest(conn: &Connection, box_id: i64) -> rusqlite::Result<Vec<ManifestLine>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT bc.content_id, bc.box_id, bc.item_id, COALESCE(si.name, ''), bc.quantity
        FROM box_contents bc
        LEFT JOIN supply_items si ON bc.item_id = si.item_id
        WHERE bc.box_id = ?1
        ORDER BY bc.content_id ASC
        "#,
    )?;

    let lines = stmt
        .query_map(params![box_id], |row| {
            Ok(ManifestLine {
                content_id: row.get(0)?,
                box_id: row.get(1)?,
                item_id: row.get(2)?,
                item_name: row.get(3)?,
                quantity: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(lines)
}

// ==========================================
// SupplyBoxRepository - 物资箱仓储
// ==========================================
pub struct SupplyBoxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplyBoxRepository {
    /// 创建新的物资箱仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 装箱：写入箱头与清单（单事务）
    ///
    /// # 参数
    /// - qr_code: 新生成的箱码（调用方保证唯一，重复时返回 UniqueConstraintViolation）
    /// - created_at: 装箱时间
    /// - destination_center_id: 目的中心
    /// - priority: 优先级标注
    /// - lines: 清单行（按顺序写入）
    ///
    /// # 返回
    /// - Ok(PackedBox): 写入后的箱与清单
    /// - Err: 数据库错误（整个事务回滚）
    pub fn create_with_manifest(
        &self,
        qr_code: &str,
        created_at: NaiveDateTime,
        destination_center_id: Option<i64>,
        priority: Priority,
        lines: &[PackLine],
    ) -> RepositoryResult<PackedBox> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            r#"
            INSERT INTO supply_boxes (qr_code, created_at, destination_center_id, priority)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![qr_code, created_at, destination_center_id, priority.to_db_str()],
        )?;
        let box_id = tx.last_insert_rowid();

        for line in lines {
            tx.execute(
                "INSERT INTO box_contents (box_id, item_id, quantity) VALUES (?1, ?2, ?3)",
                params![box_id, line.item_id, line.quantity],
            )?;
        }

        let manifest = query_manifest(&tx, box_id)?;
        let supply_box = query_box_by_code(&tx, qr_code)?
            .ok_or_else(|| RepositoryError::not_found("SupplyBox", qr_code))?;

        tx.commit()?;

        Ok(PackedBox {
            supply_box,
            manifest,
        })
    }

    /// 按箱码查询
    ///
    /// # 返回
    /// - Ok(Some(SupplyBox)): 找到
    /// - Ok(None): 箱码不存在
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<SupplyBox>> {
        let conn = self.get_conn()?;
        Ok(query_box_by_code(&conn, code)?)
    }

    /// 按 box_id 查询
    pub fn find_by_id(&self, box_id: i64) -> RepositoryResult<Option<SupplyBox>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                &format!("SELECT {} FROM supply_boxes WHERE box_id = ?1", BOX_COLUMNS),
                params![box_id],
                map_box_row,
            )
            .optional()?;
        Ok(found)
    }

    /// 加载装箱清单（空清单合法）
    pub fn load_manifest(&self, box_id: i64) -> RepositoryResult<Vec<ManifestLine>> {
        let conn = self.get_conn()?;
        Ok(query_manifest(&conn, box_id)?)
    }

    /// 查询发往指定中心的箱（新箱在前）
    pub fn list_by_destination(&self, center_id: i64) -> RepositoryResult<Vec<SupplyBox>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM supply_boxes WHERE destination_center_id = ?1 \
             ORDER BY created_at DESC, box_id DESC",
            BOX_COLUMNS
        ))?;
        let boxes = stmt
            .query_map(params![center_id], map_box_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(boxes)
    }
}
