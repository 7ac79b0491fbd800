// ==========================================
// 洪灾物资调度系统 - NGO 数据仓储
// ==========================================
// 表: ngos / ngo_inventory / box_ngo_info
// ==========================================

use crate::domain::ngo::{BoxNgoInfo, NewNgo, NewNgoInventory, Ngo, NgoInventoryEntry};
use crate::domain::types::{Priority, VerificationStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const NGO_COLUMNS: &str = "ngo_id, name, registration_no, contact_email, verification_status";

fn map_ngo_row(row: &Row<'_>) -> rusqlite::Result<Ngo> {
    let raw: String = row.get(4)?;
    let verification_status = VerificationStatus::from_db_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("未知审核状态: {}", raw).into(),
        )
    })?;
    Ok(Ngo {
        ngo_id: row.get(0)?,
        name: row.get(1)?,
        registration_no: row.get(2)?,
        contact_email: row.get(3)?,
        verification_status,
    })
}

fn map_inventory_row(row: &Row<'_>) -> rusqlite::Result<NgoInventoryEntry> {
    Ok(NgoInventoryEntry {
        inventory_id: row.get(0)?,
        ngo_id: row.get(1)?,
        item_id: row.get(2)?,
        item_name: row.get(3)?,
        quantity: row.get(4)?,
        expiry_date: row.get(5)?,
        batch_id: row.get(6)?,
        last_updated: row.get(7)?,
        source: row.get(8)?,
        notes: row.get(9)?,
    })
}

// ==========================================
// NgoRepository - NGO / 库存 / 箱归属
// ==========================================
pub struct NgoRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NgoRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== NGO 登记 =====

    /// 登记 NGO（状态为 Pending）
    ///
    /// # 返回
    /// - Ok(ngo_id)
    pub fn insert_ngo(&self, ngo: &NewNgo) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ngos (name, registration_no, contact_email, verification_status)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                ngo.name,
                ngo.registration_no,
                ngo.contact_email,
                VerificationStatus::Pending.to_db_str()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_ngo(&self, ngo_id: i64) -> RepositoryResult<Option<Ngo>> {
        let conn = self.get_conn()?;
        let ngo = conn
            .query_row(
                &format!("SELECT {} FROM ngos WHERE ngo_id = ?1", NGO_COLUMNS),
                params![ngo_id],
                map_ngo_row,
            )
            .optional()?;
        Ok(ngo)
    }

    /// 按审核状态列出 NGO（按名称排序）
    pub fn list_by_status(&self, status: VerificationStatus) -> RepositoryResult<Vec<Ngo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ngos WHERE verification_status = ?1 ORDER BY name, ngo_id",
            NGO_COLUMNS
        ))?;
        let ngos = stmt
            .query_map(params![status.to_db_str()], map_ngo_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ngos)
    }

    /// 更新审核状态
    ///
    /// # 返回
    /// - Err(NotFound): NGO 不存在
    pub fn set_verification(&self, ngo_id: i64, status: VerificationStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE ngos SET verification_status = ?1 WHERE ngo_id = ?2",
            params![status.to_db_str(), ngo_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Ngo", ngo_id));
        }
        Ok(())
    }

    // ===== 库存入库 =====

    /// 写入一条库存入库记录
    ///
    /// NGO / 物资不存在时返回 ForeignKeyViolation
    pub fn insert_inventory(
        &self,
        entry: &NewNgoInventory,
        now: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO ngo_inventory
                (ngo_id, item_id, quantity, expiry_date, batch_id, last_updated, source, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.ngo_id,
                entry.item_id,
                entry.quantity,
                entry.expiry_date,
                entry.batch_id,
                now,
                entry.source,
                entry.notes
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 某 NGO 的库存记录（最近入库在前）
    pub fn list_inventory(&self, ngo_id: i64) -> RepositoryResult<Vec<NgoInventoryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ni.inventory_id, ni.ngo_id, ni.item_id, si.name, ni.quantity,
                   ni.expiry_date, ni.batch_id, ni.last_updated, ni.source, ni.notes
            FROM ngo_inventory ni
            LEFT JOIN supply_items si ON ni.item_id = si.item_id
            WHERE ni.ngo_id = ?1
            ORDER BY ni.last_updated DESC, ni.inventory_id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![ngo_id], map_inventory_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ===== 箱归属 =====

    /// 记录物资箱所属 NGO
    ///
    /// 每箱至多关联一次，重复关联返回 UniqueConstraintViolation
    pub fn link_box(&self, box_id: i64, ngo_id: i64, now: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO box_ngo_info (box_id, ngo_id, linked_at) VALUES (?1, ?2, ?3)",
            params![box_id, ngo_id, now],
        )?;
        Ok(())
    }

    /// 查询物资箱的归属信息（含目的中心）
    pub fn find_box_info(&self, box_id: i64) -> RepositoryResult<Option<BoxNgoInfo>> {
        let conn = self.get_conn()?;
        let info = conn
            .query_row(
                r#"
                SELECT b.box_id, b.qr_code, n.ngo_id, n.name,
                       b.destination_center_id, fc.name, b.priority, bn.linked_at
                FROM box_ngo_info bn
                JOIN supply_boxes b ON bn.box_id = b.box_id
                JOIN ngos n ON bn.ngo_id = n.ngo_id
                LEFT JOIN flood_centers fc ON b.destination_center_id = fc.center_id
                WHERE bn.box_id = ?1
                "#,
                params![box_id],
                |row| {
                    let priority: Option<String> = row.get(6)?;
                    Ok(BoxNgoInfo {
                        box_id: row.get(0)?,
                        qr_code: row.get(1)?,
                        ngo_id: row.get(2)?,
                        ngo_name: row.get(3)?,
                        destination_center_id: row.get(4)?,
                        destination_center_name: row.get(5)?,
                        priority: Priority::from_db_str(priority.as_deref()),
                        linked_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{apply_migrations, configure_sqlite_connection};
    use chrono::NaiveDate;

    fn setup() -> NgoRepository {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute_batch(
            "INSERT INTO supply_items (name) VALUES ('Rice');
             INSERT INTO flood_centers (name) VALUES ('SK Kuala Krai');
             INSERT INTO supply_boxes (qr_code, created_at, destination_center_id, priority)
                 VALUES ('box-1', '2024-12-01 08:00:00', 1, 'High');",
        )
        .unwrap();
        NgoRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn ngo(name: &str) -> NewNgo {
        NewNgo {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_only_requested_status_is_listed() {
        let repo = setup();
        let mercy = repo.insert_ngo(&ngo("MERCY Malaysia")).unwrap();
        let other = repo.insert_ngo(&ngo("Unverified Relief")).unwrap();

        assert!(repo.list_by_status(VerificationStatus::Verified).unwrap().is_empty());
        repo.set_verification(mercy, VerificationStatus::Verified).unwrap();

        let verified = repo.list_by_status(VerificationStatus::Verified).unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].ngo_id, mercy);
        assert_eq!(
            repo.find_ngo(other).unwrap().unwrap().verification_status,
            VerificationStatus::Pending
        );

        let err = repo.set_verification(99, VerificationStatus::Verified).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_inventory_requires_known_ngo_and_item() {
        let repo = setup();
        let ngo_id = repo.insert_ngo(&ngo("MERCY Malaysia")).unwrap();
        let entry = NewNgoInventory {
            ngo_id,
            item_id: 1,
            quantity: 40,
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            batch_id: Some("B-77".to_string()),
            source: Some("Gudang Kota Bharu".to_string()),
            notes: None,
        };
        repo.insert_inventory(&entry, now()).unwrap();

        let rows = repo.list_inventory(ngo_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_name.as_deref(), Some("Rice"));
        assert_eq!(rows[0].expiry_date, NaiveDate::from_ymd_opt(2025, 6, 30));

        let err = repo
            .insert_inventory(&NewNgoInventory { ngo_id: 404, ..entry }, now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_box_links_once() {
        let repo = setup();
        let ngo_id = repo.insert_ngo(&ngo("MERCY Malaysia")).unwrap();
        assert!(repo.find_box_info(1).unwrap().is_none());

        repo.link_box(1, ngo_id, now()).unwrap();
        let info = repo.find_box_info(1).unwrap().unwrap();
        assert_eq!(info.qr_code, "box-1");
        assert_eq!(info.ngo_name, "MERCY Malaysia");
        assert_eq!(info.destination_center_name.as_deref(), Some("SK Kuala Krai"));
        assert_eq!(info.priority, Priority::High);

        let err = repo.link_box(1, ngo_id, now()).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }
}
