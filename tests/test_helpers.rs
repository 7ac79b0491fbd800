// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use flood_relief_logistics::app::AppState;
use flood_relief_logistics::db::open_shared_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并执行迁移
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    // 打开一次以执行迁移
    open_shared_connection(&db_path)?;

    Ok((temp_file, db_path))
}

/// 创建临时库 + AppState
pub fn setup_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    (temp_file, state)
}

/// 2024-12-01 的某个时刻
pub fn ts(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

// ==========================================
// 数据准备
// ==========================================

/// 基础参考数据
pub struct Fixture {
    /// [SK Kampung Sireh, Dewan Orang Ramai]
    pub centers: [i64; 2],
    /// [Rice, Water, Blanket]
    pub items: [i64; 3],
}

pub fn seed_reference(conn: &Arc<Mutex<Connection>>) -> Fixture {
    let c = conn.lock().unwrap();
    c.execute_batch(
        r#"
        INSERT INTO flood_centers (center_id, name, state) VALUES
            (1, 'SK Kampung Sireh', 'Kelantan'),
            (2, 'Dewan Orang Ramai', 'Pahang');
        INSERT INTO supply_items (item_id, name, category, unit) VALUES
            (1, 'Rice', 'Food & Water', 'bag'),
            (2, 'Water', 'Food & Water', 'bottle'),
            (3, 'Blanket', 'Clothing & Bedding', 'pcs');
        "#,
    )
    .unwrap();
    Fixture {
        centers: [1, 2],
        items: [1, 2, 3],
    }
}

/// 写入物资箱与清单，返回 box_id
pub fn insert_box(
    conn: &Arc<Mutex<Connection>>,
    code: &str,
    destination: Option<i64>,
    lines: &[(i64, i64)],
) -> i64 {
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO supply_boxes (qr_code, created_at, destination_center_id, priority)
         VALUES (?1, ?2, ?3, 'High')",
        params![code, ts(6, 0), destination],
    )
    .unwrap();
    let box_id = c.last_insert_rowid();
    for (item_id, quantity) in lines {
        c.execute(
            "INSERT INTO box_contents (box_id, item_id, quantity) VALUES (?1, ?2, ?3)",
            params![box_id, item_id, quantity],
        )
        .unwrap();
    }
    box_id
}

/// 写入待处理需求，返回 demand_id
pub fn insert_demand(
    conn: &Arc<Mutex<Connection>>,
    center_id: i64,
    item_id: i64,
    quantity: i64,
    priority: Option<&str>,
    request_date: NaiveDateTime,
) -> i64 {
    let c = conn.lock().unwrap();
    c.execute(
        "INSERT INTO supply_demands (center_id, item_id, quantity, priority, request_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![center_id, item_id, quantity, priority, request_date],
    )
    .unwrap();
    c.last_insert_rowid()
}

// ==========================================
// 断言辅助
// ==========================================

pub fn count(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    conn.lock()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

pub fn demand_status(conn: &Arc<Mutex<Connection>>, demand_id: i64) -> String {
    conn.lock()
        .unwrap()
        .query_row(
            "SELECT status FROM supply_demands WHERE demand_id = ?1",
            params![demand_id],
            |r| r.get(0),
        )
        .unwrap()
}
