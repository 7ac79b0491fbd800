// ==========================================
// 洪灾物资调度系统 - 参考数据仓储
// ==========================================
// 表: supply_items / flood_centers
// ==========================================

use crate::domain::reference::{FloodCenter, NewFloodCenter, NewSupplyItem, SupplyItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<SupplyItem> {
    Ok(SupplyItem {
        item_id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        unit: row.get(3)?,
    })
}

fn map_center_row(row: &Row<'_>) -> rusqlite::Result<FloodCenter> {
    Ok(FloodCenter {
        center_id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        address: row.get(3)?,
        contact_phone: row.get(4)?,
    })
}

// ==========================================
// ReferenceDataRepository - 物资品类 / 安置中心
// ==========================================
pub struct ReferenceDataRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceDataRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 物资品类 =====

    /// 登记物资品类
    ///
    /// # 返回
    /// - Ok(item_id)
    pub fn insert_item(&self, item: &NewSupplyItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO supply_items (name, category, unit) VALUES (?1, ?2, ?3)",
            params![item.name, item.category, item.unit],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_item(&self, item_id: i64) -> RepositoryResult<Option<SupplyItem>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                "SELECT item_id, name, category, unit FROM supply_items WHERE item_id = ?1",
                params![item_id],
                map_item_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn list_items(&self) -> RepositoryResult<Vec<SupplyItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, name, category, unit FROM supply_items ORDER BY category, name",
        )?;
        let items = stmt
            .query_map([], map_item_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    // ===== 安置中心 =====

    /// 登记安置中心
    ///
    /// # 返回
    /// - Ok(center_id)
    pub fn insert_center(&self, center: &NewFloodCenter) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO flood_centers (name, state, address, contact_phone)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![center.name, center.state, center.address, center.contact_phone],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_center(&self, center_id: i64) -> RepositoryResult<Option<FloodCenter>> {
        let conn = self.get_conn()?;
        let center = conn
            .query_row(
                r#"
                SELECT center_id, name, state, address, contact_phone
                FROM flood_centers WHERE center_id = ?1
                "#,
                params![center_id],
                map_center_row,
            )
            .optional()?;
        Ok(center)
    }

    pub fn list_centers(&self) -> RepositoryResult<Vec<FloodCenter>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT center_id, name, state, address, contact_phone
            FROM flood_centers ORDER BY state, name
            "#,
        )?;
        let centers = stmt
            .query_map([], map_center_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(centers)
    }

    /// 删除安置中心（存量登记级联删除）
    ///
    /// # 返回
    /// - Err(NotFound): 中心不存在
    /// - Err(ForeignKeyViolation): 仍有物资箱以该中心为目的地
    pub fn delete_center(&self, center_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM flood_centers WHERE center_id = ?1",
            params![center_id],
        )?;
        if deleted == 0 {
            return Err(RepositoryError::not_found("FloodCenter", center_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{apply_migrations, configure_sqlite_connection};

    fn setup() -> ReferenceDataRepository {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        ReferenceDataRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn center(name: &str) -> NewFloodCenter {
        NewFloodCenter {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_delete_center_cascades_stock_rows() {
        let repo = setup();
        let id = repo.insert_center(&center("SK Kampung Sireh")).unwrap();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute_batch(&format!(
                "INSERT INTO supply_items (name) VALUES ('Rice');
                 INSERT INTO supply_centers (center_id, item_id, quantity, date)
                     VALUES ({}, 1, 12, '2024-12-01');",
                id
            ))
            .unwrap();
        }

        repo.delete_center(id).unwrap();
        assert!(repo.find_center(id).unwrap().is_none());
        let remaining: i64 = repo
            .get_conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM supply_centers", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);

        let err = repo.delete_center(id).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_delete_center_blocked_by_boxes() {
        let repo = setup();
        let id = repo.insert_center(&center("Dewan Orang Ramai")).unwrap();
        repo.get_conn()
            .unwrap()
            .execute(
                "INSERT INTO supply_boxes (qr_code, created_at, destination_center_id) VALUES ('box-9', '2024-12-01 08:00:00', ?1)",
                params![id],
            )
            .unwrap();

        let err = repo.delete_center(id).unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
        assert!(repo.find_center(id).unwrap().is_some());
    }
}
