// ==========================================
// 洪灾物资调度系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 内置迁移脚本，按版本号顺序执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
///
/// 并发扫码时，后到的写事务在此时间内等待写锁而不是立即报 busy
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("../migrations/0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("../migrations/0002_ngo_donation_stock.sql"),
    },
];

/// 当前代码所期望的 schema_version
pub fn current_schema_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn, crate::perf::PerfSettings::from_env());
    Ok(conn)
}

/// 打开连接、执行迁移，并包装为仓储共享的连接句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    let mut conn = open_sqlite_connection(db_path)?;
    apply_migrations(&mut conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 执行所有未应用的迁移（单事务）
///
/// # 返回
/// - Ok(n): 本次执行的迁移数量
pub fn apply_migrations(conn: &mut Connection) -> rusqlite::Result<usize> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )?;

    let current = read_schema_version(conn)?.unwrap_or(0);
    let latest = current_schema_version();
    if current > latest {
        tracing::warn!(
            db_version = current,
            latest_supported = latest,
            "数据库 schema 版本高于当前程序，跳过迁移"
        );
        return Ok(0);
    }

    let tx = conn.transaction()?;
    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )?;
        applied += 1;
    }
    tx.commit()?;

    if applied > 0 {
        tracing::info!(from = current, to = latest, applied, "schema 迁移完成");
    }
    Ok(applied)
}
