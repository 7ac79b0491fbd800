// ==========================================
// 洪灾物资调度系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::i18n;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ReconcileConfig - 核销行为开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// 严格数量模式：箱内数量小于最早需求数量时不核销
    pub strict_quantity_match: bool,
    /// 是否把未核销签收行写入 unmatched_receipts
    pub record_unmatched: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            strict_quantity_match: false,
            record_unmatched: true,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self.get_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_bool(&self, key: &str, default: bool) -> RepositoryResult<bool> {
        let raw = match self.get_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match parse_bool(&raw) {
            Some(v) => Ok(v),
            None => {
                tracing::warn!(config_key = key, raw_value = %raw, "布尔配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    // ===== 核销配置 =====

    /// 读取核销行为开关（未配置或格式错误时取默认值）
    pub fn reconcile_config(&self) -> RepositoryResult<ReconcileConfig> {
        let defaults = ReconcileConfig::default();
        Ok(ReconcileConfig {
            strict_quantity_match: self.get_bool(
                config_keys::STRICT_QUANTITY_MATCH,
                defaults.strict_quantity_match,
            )?,
            record_unmatched: self
                .get_bool(config_keys::RECORD_UNMATCHED, defaults.record_unmatched)?,
        })
    }

    // ===== 界面配置 =====

    /// 读取界面语言（不支持的语言回退为 en）
    pub fn locale(&self) -> RepositoryResult<String> {
        let raw = self.get_or_default(config_keys::UI_LOCALE, i18n::DEFAULT_LOCALE)?;
        Ok(i18n::normalize_locale(&raw).to_string())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 核销
    pub const STRICT_QUANTITY_MATCH: &str = "reconcile.strict_quantity_match";
    pub const RECORD_UNMATCHED: &str = "reconcile.record_unmatched";

    // 界面
    pub const UI_LOCALE: &str = "ui.locale";
}
