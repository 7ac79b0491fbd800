// ==========================================
// 洪灾物资调度系统 - 捐款数据仓储
// ==========================================
// 表: donations / donation_allocations
// 红线: 分配在 IMMEDIATE 事务内校验余额，总额不超过捐款金额
// ==========================================

use crate::domain::donation::{Donation, DonationAllocation, DonationTrack, NewDonation};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const DONATION_COLUMNS: &str =
    "d.donation_id, d.ngo_id, d.donor_name, d.donor_email, d.amount_cents, d.donation_date, d.payment_method";

fn map_donation_row(row: &Row<'_>) -> rusqlite::Result<Donation> {
    Ok(Donation {
        donation_id: row.get(0)?,
        ngo_id: row.get(1)?,
        donor_name: row.get(2)?,
        donor_email: row.get(3)?,
        amount_cents: row.get(4)?,
        donation_date: row.get(5)?,
        payment_method: row.get(6)?,
    })
}

fn map_allocation_row(row: &Row<'_>) -> rusqlite::Result<DonationAllocation> {
    Ok(DonationAllocation {
        allocation_id: row.get(0)?,
        donation_id: row.get(1)?,
        purpose: row.get(2)?,
        amount_cents: row.get(3)?,
        allocation_date: row.get(4)?,
    })
}

fn query_allocations(conn: &Connection, donation_id: i64) -> rusqlite::Result<Vec<DonationAllocation>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT allocation_id, donation_id, purpose, amount_cents, allocation_date
        FROM donation_allocations
        WHERE donation_id = ?1
        ORDER BY allocation_date, allocation_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![donation_id], map_allocation_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// ==========================================
// DonationRepository - 捐款 / 分配
// ==========================================
pub struct DonationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DonationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录捐款
    ///
    /// # 参数
    /// - donation: 捐款输入（邮箱由调用方规范化）
    /// - now: 捐款时间
    ///
    /// # 返回
    /// - Ok(donation_id)
    pub fn insert_donation(&self, donation: &NewDonation, now: NaiveDateTime) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO donations
                (ngo_id, donor_name, donor_email, amount_cents, donation_date, payment_method)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                donation.ngo_id,
                donation.donor_name,
                donation.donor_email,
                donation.amount_cents,
                now,
                donation.payment_method
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_donation(&self, donation_id: i64) -> RepositoryResult<Option<Donation>> {
        let conn = self.get_conn()?;
        let donation = conn
            .query_row(
                &format!(
                    "SELECT {} FROM donations d WHERE d.donation_id = ?1",
                    DONATION_COLUMNS
                ),
                params![donation_id],
                map_donation_row,
            )
            .optional()?;
        Ok(donation)
    }

    /// 分配捐款用途
    ///
    /// # 返回
    /// - Ok(allocation_id)
    /// - Err(NotFound): 捐款不存在
    /// - Err(OverAllocation): 超出剩余可分配金额
    pub fn allocate(
        &self,
        donation_id: i64,
        purpose: &str,
        amount_cents: i64,
        now: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let total: i64 = tx
            .query_row(
                "SELECT amount_cents FROM donations WHERE donation_id = ?1",
                params![donation_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::not_found("Donation", donation_id))?;
        let allocated: i64 = tx.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM donation_allocations WHERE donation_id = ?1",
            params![donation_id],
            |row| row.get(0),
        )?;

        let remaining_cents = total - allocated;
        if amount_cents > remaining_cents {
            return Err(RepositoryError::OverAllocation {
                donation_id,
                remaining_cents,
            });
        }

        tx.execute(
            r#"
            INSERT INTO donation_allocations (donation_id, purpose, amount_cents, allocation_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![donation_id, purpose, amount_cents, now],
        )?;
        let allocation_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(allocation_id)
    }

    /// 按捐款人邮箱追踪捐款（最新捐款在前，附带各自的分配明细）
    pub fn track_by_email(&self, donor_email: &str) -> RepositoryResult<Vec<DonationTrack>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}, n.name
            FROM donations d
            LEFT JOIN ngos n ON d.ngo_id = n.ngo_id
            WHERE d.donor_email = ?1
            ORDER BY d.donation_date DESC, d.donation_id DESC
            "#,
            DONATION_COLUMNS
        ))?;
        let donations = stmt
            .query_map(params![donor_email], |row| {
                Ok((map_donation_row(row)?, row.get::<_, Option<String>>(7)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tracks = Vec::with_capacity(donations.len());
        for (donation, ngo_name) in donations {
            let allocations = query_allocations(&conn, donation.donation_id)?;
            tracks.push(DonationTrack {
                donation,
                ngo_name,
                allocations,
            });
        }
        Ok(tracks)
    }
}
