// ==========================================
// 仓储执行系统 - 任务仓储
// ==========================================
// 职责: 任务 (missions) 与任务行 (mission_lines) 的数据访问
// 红线: Repository 不含业务逻辑, 状态转换校验在 engine 层完成
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::domain::mission::{Mission, MissionLine, MissionLinePayload, MissionWithLines};
use crate::domain::types::{MissionState, MissionType};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 解析仓储层统一的时间戳格式
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime_opt(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    match s {
        Some(s) => Ok(Some(parse_datetime(idx, s)?)),
        None => Ok(None),
    }
}

const MISSION_COLUMNS: &str = r#"id, mission_no, mission_type, state, priority,
    created_by_operator_id, assigned_executor_id, created_at, started_at, completed_at, cancel_reason"#;

const LINE_COLUMNS: &str =
    "id, mission_id, from_location_id, to_location_id, item_id, hu_id, qty, qty_done";

pub struct MissionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MissionRepository {
    /// 创建新的MissionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建任务及其全部行项 (单事务; 任一失败整体回滚)
    ///
    /// mission_no 冲突以 UniqueConstraintViolation 上抛
    pub fn create_with_lines(
        &self,
        mission: &Mission,
        lines: &[MissionLine],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO missions (
                id, mission_no, mission_type, state, priority,
                created_by_operator_id, assigned_executor_id,
                created_at, started_at, completed_at, cancel_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &mission.id,
                &mission.mission_no,
                mission.mission_type.to_db_str(),
                mission.state.to_db_str(),
                &mission.priority,
                &mission.created_by_operator_id,
                &mission.assigned_executor_id,
                mission.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                mission
                    .started_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                mission
                    .completed_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                &mission.cancel_reason,
            ],
        )?;

        for line in lines {
            let (item_id, hu_id) = line.payload.to_columns();
            tx.execute(
                r#"INSERT INTO mission_lines (
                    id, mission_id, from_location_id, to_location_id,
                    item_id, hu_id, qty, qty_done
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &line.id,
                    &line.mission_id,
                    &line.from_location_id,
                    &line.to_location_id,
                    item_id,
                    hu_id,
                    &line.qty,
                    &line.qty_done,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 按任务ID查询 (不含行项)
    pub fn find_by_id(&self, mission_id: &str) -> RepositoryResult<Option<Mission>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, mission_id)
    }

    /// 按任务ID查询 (事务内)
    pub fn find_by_id_tx(conn: &Connection, mission_id: &str) -> RepositoryResult<Option<Mission>> {
        match conn.query_row(
            &format!("SELECT {} FROM missions WHERE id = ?", MISSION_COLUMNS),
            params![mission_id],
            |row| Self::map_mission_row(row),
        ) {
            Ok(mission) => Ok(Some(mission)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按任务ID查询含全部行项
    pub fn find_with_lines(&self, mission_id: &str) -> RepositoryResult<Option<MissionWithLines>> {
        let conn = self.get_conn()?;
        Self::find_with_lines_tx(&conn, mission_id)
    }

    /// 按任务ID查询含全部行项 (事务内)
    pub fn find_with_lines_tx(
        conn: &Connection,
        mission_id: &str,
    ) -> RepositoryResult<Option<MissionWithLines>> {
        let mission = match Self::find_by_id_tx(conn, mission_id)? {
            Some(mission) => mission,
            None => return Ok(None),
        };
        let lines = Self::lines_for_mission_tx(conn, mission_id)?;
        Ok(Some(MissionWithLines { mission, lines }))
    }

    /// 任务列表 (可按状态过滤, 按创建顺序)
    pub fn list(
        &self,
        state: Option<MissionState>,
        limit: i64,
    ) -> RepositoryResult<Vec<Mission>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM missions
               WHERE (?1 IS NULL OR state = ?1)
               ORDER BY rowid
               LIMIT ?2"#,
            MISSION_COLUMNS
        ))?;

        let missions = stmt
            .query_map(params![state.map(|s| s.to_db_str()), limit], |row| {
                Self::map_mission_row(row)
            })?
            .collect::<Result<Vec<Mission>, _>>()?;

        Ok(missions)
    }

    /// 更新任务优先级
    pub fn update_priority(&self, mission_id: &str, priority: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE missions SET priority = ? WHERE id = ?",
            params![priority, mission_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            });
        }
        Ok(())
    }

    /// 指派执行者: DRAFT -> ASSIGNED
    pub fn mark_assigned(&self, mission_id: &str, executor_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE missions SET state = ?, assigned_executor_id = ? WHERE id = ?",
            params![MissionState::Assigned.to_db_str(), executor_id, mission_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            });
        }
        Ok(())
    }

    /// 启动执行: ASSIGNED -> IN_PROGRESS, 记录启动时间
    pub fn mark_started(&self, mission_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();
        let rows_affected = conn.execute(
            "UPDATE missions SET state = ?, started_at = ? WHERE id = ?",
            params![
                MissionState::InProgress.to_db_str(),
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                mission_id
            ],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            });
        }
        Ok(())
    }

    /// 完成任务: IN_PROGRESS -> COMPLETED, 记录完成时间
    pub fn mark_completed(&self, mission_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc();
        let rows_affected = conn.execute(
            "UPDATE missions SET state = ?, completed_at = ? WHERE id = ?",
            params![
                MissionState::Completed.to_db_str(),
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                mission_id
            ],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            });
        }
        Ok(())
    }

    /// 取消任务: 任意非终态 -> CANCELLED, 保留取消原因
    ///
    /// completed_at 不写入, 取消不等于完成
    pub fn mark_cancelled(&self, mission_id: &str, reason: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE missions SET state = ?, cancel_reason = ? WHERE id = ?",
            params![MissionState::Cancelled.to_db_str(), reason, mission_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Mission".to_string(),
                id: mission_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按行项ID查询
    pub fn find_line_by_id(&self, line_id: &str) -> RepositoryResult<Option<MissionLine>> {
        let conn = self.get_conn()?;
        Self::find_line_by_id_tx(&conn, line_id)
    }

    /// 按行项ID查询 (事务内)
    pub fn find_line_by_id_tx(
        conn: &Connection,
        line_id: &str,
    ) -> RepositoryResult<Option<MissionLine>> {
        match conn.query_row(
            &format!("SELECT {} FROM mission_lines WHERE id = ?", LINE_COLUMNS),
            params![line_id],
            |row| Self::map_line_row(row),
        ) {
            Ok(line) => Ok(Some(line)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询任务的全部行项 (创建顺序)
    pub fn lines_for_mission(&self, mission_id: &str) -> RepositoryResult<Vec<MissionLine>> {
        let conn = self.get_conn()?;
        Self::lines_for_mission_tx(&conn, mission_id)
    }

    /// 查询任务的全部行项 (事务内)
    pub fn lines_for_mission_tx(
        conn: &Connection,
        mission_id: &str,
    ) -> RepositoryResult<Vec<MissionLine>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM mission_lines WHERE mission_id = ? ORDER BY rowid",
            LINE_COLUMNS
        ))?;

        let lines = stmt
            .query_map(params![mission_id], |row| Self::map_line_row(row))?
            .collect::<Result<Vec<MissionLine>, _>>()?;

        Ok(lines)
    }

    /// 累加行项已完成数量 (事务内)
    ///
    /// qty_done 的单调性与上限由校验器在调用前保证
    pub fn increment_line_qty_done_tx(
        conn: &Connection,
        line_id: &str,
        qty_delta: f64,
    ) -> RepositoryResult<()> {
        let rows_affected = conn.execute(
            "UPDATE mission_lines SET qty_done = qty_done + ? WHERE id = ?",
            params![qty_delta, line_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MissionLine".to_string(),
                id: line_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到Mission对象
    fn map_mission_row(row: &rusqlite::Row) -> rusqlite::Result<Mission> {
        let type_str: String = row.get(2)?;
        let state_str: String = row.get(3)?;
        Ok(Mission {
            id: row.get(0)?,
            mission_no: row.get(1)?,
            mission_type: MissionType::from_str(&type_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    format!("未知任务类型: {}", type_str).into(),
                )
            })?,
            state: MissionState::from_str(&state_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("未知任务状态: {}", state_str).into(),
                )
            })?,
            priority: row.get(4)?,
            created_by_operator_id: row.get(5)?,
            assigned_executor_id: row.get(6)?,
            created_at: parse_datetime(7, row.get::<_, String>(7)?)?,
            started_at: parse_datetime_opt(8, row.get::<_, Option<String>>(8)?)?,
            completed_at: parse_datetime_opt(9, row.get::<_, Option<String>>(9)?)?,
            cancel_reason: row.get(10)?,
        })
    }

    /// 映射数据库行到MissionLine对象
    fn map_line_row(row: &rusqlite::Row) -> rusqlite::Result<MissionLine> {
        let item_id: Option<String> = row.get(4)?;
        let hu_id: Option<String> = row.get(5)?;
        let payload = MissionLinePayload::from_columns(item_id, hu_id).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Null,
                "任务行 item_id 与 hu_id 同时为空".into(),
            )
        })?;

        Ok(MissionLine {
            id: row.get(0)?,
            mission_id: row.get(1)?,
            from_location_id: row.get(2)?,
            to_location_id: row.get(3)?,
            payload,
            qty: row.get(6)?,
            qty_done: row.get(7)?,
        })
    }
}
