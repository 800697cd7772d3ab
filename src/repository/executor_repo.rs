// ==========================================
// 仓储执行系统 - 执行者仓储
// ==========================================
// 职责: 执行者 (executors, 人工/AGV) 的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::executor::Executor;
use crate::domain::types::ExecutorType;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 解析仓储层统一的时间戳格式
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

const EXECUTOR_COLUMNS: &str =
    "id, code, name, executor_type, max_payload_kg, active, last_seen_at, created_at";

pub struct ExecutorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExecutorRepository {
    /// 创建新的ExecutorRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建执行者; code 冲突以 UniqueConstraintViolation 上抛
    pub fn create(
        &self,
        code: &str,
        name: &str,
        executor_type: ExecutorType,
        max_payload_kg: f64,
        active: bool,
    ) -> RepositoryResult<Executor> {
        let conn = self.get_conn()?;
        let executor = Executor {
            id: format!("EXE_{}", Uuid::new_v4()),
            code: code.to_string(),
            name: name.to_string(),
            executor_type,
            max_payload_kg,
            active,
            last_seen_at: None,
            created_at: Utc::now().naive_utc(),
        };

        conn.execute(
            r#"INSERT INTO executors (
                id, code, name, executor_type, max_payload_kg, active, last_seen_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &executor.id,
                &executor.code,
                &executor.name,
                executor.executor_type.to_db_str(),
                &executor.max_payload_kg,
                &executor.active,
                Option::<String>::None,
                executor.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(executor)
    }

    /// 按执行者ID查询
    pub fn find_by_id(&self, executor_id: &str) -> RepositoryResult<Option<Executor>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, executor_id)
    }

    /// 按执行者ID查询 (事务内)
    pub fn find_by_id_tx(
        conn: &Connection,
        executor_id: &str,
    ) -> RepositoryResult<Option<Executor>> {
        match conn.query_row(
            &format!("SELECT {} FROM executors WHERE id = ?", EXECUTOR_COLUMNS),
            params![executor_id],
            |row| Self::map_row(row),
        ) {
            Ok(executor) => Ok(Some(executor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 执行者列表 (可按类型过滤, 创建顺序)
    pub fn list(
        &self,
        executor_type: Option<ExecutorType>,
        limit: i64,
    ) -> RepositoryResult<Vec<Executor>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM executors
               WHERE (?1 IS NULL OR executor_type = ?1)
               ORDER BY rowid
               LIMIT ?2"#,
            EXECUTOR_COLUMNS
        ))?;

        let executors = stmt
            .query_map(
                params![executor_type.map(|t| t.to_db_str()), limit],
                |row| Self::map_row(row),
            )?
            .collect::<Result<Vec<Executor>, _>>()?;

        Ok(executors)
    }

    /// 部分更新 (None 字段保持原值)
    pub fn update(
        &self,
        executor_id: &str,
        name: Option<&str>,
        executor_type: Option<ExecutorType>,
        max_payload_kg: Option<f64>,
        active: Option<bool>,
        last_seen_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"UPDATE executors
               SET name = COALESCE(?, name),
                   executor_type = COALESCE(?, executor_type),
                   max_payload_kg = COALESCE(?, max_payload_kg),
                   active = COALESCE(?, active),
                   last_seen_at = COALESCE(?, last_seen_at)
               WHERE id = ?"#,
            params![
                name,
                executor_type.map(|t| t.to_db_str()),
                max_payload_kg,
                active,
                last_seen_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                executor_id
            ],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Executor".to_string(),
                id: executor_id.to_string(),
            });
        }
        Ok(())
    }

    /// 心跳: 刷新最近在线时间
    pub fn touch_last_seen(&self, executor_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();
        let rows_affected = conn.execute(
            "UPDATE executors SET last_seen_at = ? WHERE id = ?",
            params![now.format("%Y-%m-%d %H:%M:%S").to_string(), executor_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Executor".to_string(),
                id: executor_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到Executor对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Executor> {
        let type_str: String = row.get(3)?;
        let last_seen_at: Option<String> = row.get(6)?;
        Ok(Executor {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            executor_type: ExecutorType::from_str(&type_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("未知执行者类型: {}", type_str).into(),
                )
            })?,
            max_payload_kg: row.get(4)?,
            active: row.get(5)?,
            last_seen_at: match last_seen_at {
                Some(s) => Some(parse_datetime(6, s)?),
                None => None,
            },
            created_at: parse_datetime(7, row.get::<_, String>(7)?)?,
        })
    }
}
