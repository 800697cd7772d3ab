// ==========================================
// 仓储执行系统 - 托盘仓储
// ==========================================
// 职责: 托盘 (handling_units) 的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::handling_unit::HandlingUnit;
use crate::domain::types::HandlingUnitStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 解析仓储层统一的时间戳格式
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub struct HandlingUnitRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HandlingUnitRepository {
    /// 创建新的HandlingUnitRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建托盘; hu_code 冲突以 UniqueConstraintViolation 上抛
    pub fn create(
        &self,
        hu_code: &str,
        location_id: &str,
        status: HandlingUnitStatus,
    ) -> RepositoryResult<HandlingUnit> {
        let conn = self.get_conn()?;
        let hu = HandlingUnit {
            id: format!("HU_{}", Uuid::new_v4()),
            hu_code: hu_code.to_string(),
            location_id: location_id.to_string(),
            status,
            created_at: Utc::now().naive_utc(),
        };

        conn.execute(
            r#"INSERT INTO handling_units (id, hu_code, location_id, status, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &hu.id,
                &hu.hu_code,
                &hu.location_id,
                hu.status.to_db_str(),
                hu.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(hu)
    }

    /// 按托盘ID查询
    pub fn find_by_id(&self, hu_id: &str) -> RepositoryResult<Option<HandlingUnit>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, hu_id)
    }

    /// 按托盘ID查询 (事务内)
    pub fn find_by_id_tx(conn: &Connection, hu_id: &str) -> RepositoryResult<Option<HandlingUnit>> {
        match conn.query_row(
            "SELECT id, hu_code, location_id, status, created_at FROM handling_units WHERE id = ?",
            params![hu_id],
            |row| Self::map_row(row),
        ) {
            Ok(hu) => Ok(Some(hu)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按托盘编码查询
    pub fn find_by_code(&self, hu_code: &str) -> RepositoryResult<Option<HandlingUnit>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT id, hu_code, location_id, status, created_at FROM handling_units WHERE hu_code = ?",
            params![hu_code],
            |row| Self::map_row(row),
        ) {
            Ok(hu) => Ok(Some(hu)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 托盘列表 (创建顺序)
    pub fn list(&self, limit: i64) -> RepositoryResult<Vec<HandlingUnit>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, hu_code, location_id, status, created_at
               FROM handling_units
               ORDER BY rowid
               LIMIT ?"#,
        )?;

        let units = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<HandlingUnit>, _>>()?;

        Ok(units)
    }

    /// 部分更新 (None 字段保持原值)
    pub fn update(
        &self,
        hu_id: &str,
        location_id: Option<&str>,
        status: Option<HandlingUnitStatus>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"UPDATE handling_units
               SET location_id = COALESCE(?, location_id),
                   status = COALESCE(?, status)
               WHERE id = ?"#,
            params![location_id, status.map(|s| s.to_db_str()), hu_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "HandlingUnit".to_string(),
                id: hu_id.to_string(),
            });
        }
        Ok(())
    }

    /// 整托搬运落位 (事务内): 更新托盘当前库位
    pub fn relocate_tx(conn: &Connection, hu_id: &str, location_id: &str) -> RepositoryResult<()> {
        let rows_affected = conn.execute(
            "UPDATE handling_units SET location_id = ? WHERE id = ?",
            params![location_id, hu_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "HandlingUnit".to_string(),
                id: hu_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到HandlingUnit对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<HandlingUnit> {
        let status_str: String = row.get(3)?;
        Ok(HandlingUnit {
            id: row.get(0)?,
            hu_code: row.get(1)?,
            location_id: row.get(2)?,
            status: HandlingUnitStatus::from_str(&status_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("未知托盘状态: {}", status_str).into(),
                )
            })?,
            created_at: parse_datetime(4, row.get::<_, String>(4)?)?,
        })
    }
}
