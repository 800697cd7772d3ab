// ==========================================
// 仓储执行系统 - 库存仓储
// ==========================================
// 职责: 库存持仓 (inventory_positions) 与移动台账 (inventory_movements) 的数据访问
// 红线: Repository 不含业务逻辑
// 并发控制: apply_delta_if_version 是唯一的数量变更入口,
//           单条带版本条件的 UPDATE, 失败以 Ok(false) 信号返回
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::inventory::{InventoryMovement, InventoryPosition};
use crate::domain::types::MovementType;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 解析仓储层统一的时间戳格式
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// InventoryPositionRepository - 库存持仓仓储
// ==========================================
pub struct InventoryPositionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryPositionRepository {
    /// 创建新的InventoryPositionRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按持仓ID查询
    pub fn find_by_id(&self, position_id: &str) -> RepositoryResult<Option<InventoryPosition>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, position_id)
    }

    /// 按持仓ID查询 (事务内)
    pub fn find_by_id_tx(
        conn: &Connection,
        position_id: &str,
    ) -> RepositoryResult<Option<InventoryPosition>> {
        match conn.query_row(
            r#"SELECT id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at
               FROM inventory_positions
               WHERE id = ?"#,
            params![position_id],
            |row| Self::map_row(row),
        ) {
            Ok(position) => Ok(Some(position)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 (托盘, 物料) 复合键查询; 不存在是合法结果而非错误
    pub fn find_by_pair(
        &self,
        hu_id: &str,
        item_id: &str,
    ) -> RepositoryResult<Option<InventoryPosition>> {
        let conn = self.get_conn()?;
        Self::find_by_pair_tx(&conn, hu_id, item_id)
    }

    /// 按 (托盘, 物料) 复合键查询 (事务内)
    pub fn find_by_pair_tx(
        conn: &Connection,
        hu_id: &str,
        item_id: &str,
    ) -> RepositoryResult<Option<InventoryPosition>> {
        match conn.query_row(
            r#"SELECT id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at
               FROM inventory_positions
               WHERE hu_id = ? AND item_id = ?"#,
            params![hu_id, item_id],
            |row| Self::map_row(row),
        ) {
            Ok(position) => Ok(Some(position)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 创建持仓 (version 从 1 起)
    pub fn create(
        &self,
        hu_id: &str,
        item_id: &str,
        initial_qty: f64,
    ) -> RepositoryResult<InventoryPosition> {
        let conn = self.get_conn()?;
        Self::create_tx(&conn, hu_id, item_id, initial_qty)
    }

    /// 创建持仓 (事务内)
    pub fn create_tx(
        conn: &Connection,
        hu_id: &str,
        item_id: &str,
        initial_qty: f64,
    ) -> RepositoryResult<InventoryPosition> {
        let now = Utc::now().naive_utc();
        let position = InventoryPosition {
            id: format!("POS_{}", Uuid::new_v4()),
            hu_id: hu_id.to_string(),
            item_id: item_id.to_string(),
            qty_on_hand: initial_qty,
            qty_reserved: 0.0,
            version: 1,
            updated_at: now,
        };

        conn.execute(
            r#"INSERT INTO inventory_positions (
                id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &position.id,
                &position.hu_id,
                &position.item_id,
                &position.qty_on_hand,
                &position.qty_reserved,
                &position.version,
                position.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(position)
    }

    /// 版本校验的数量增量更新 (核心并发原语)
    ///
    /// 单条条件 UPDATE: 仅当存储版本仍等于 expected_version
    /// 且增量后数量 >= 0 时生效, 同时 version += 1。
    ///
    /// # 返回
    /// - Ok(true): 更新生效
    /// - Ok(false): 版本不匹配或数量将为负, 未发生任何变更 (调用方决定重试或上抛冲突)
    ///
    /// # 红线
    /// - 不自动重试; 失败即 "无变更发生"
    pub fn apply_delta_if_version(
        &self,
        position_id: &str,
        expected_version: i64,
        delta: f64,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Self::apply_delta_if_version_tx(&conn, position_id, expected_version, delta)
    }

    /// 版本校验的数量增量更新 (事务内)
    pub fn apply_delta_if_version_tx(
        conn: &Connection,
        position_id: &str,
        expected_version: i64,
        delta: f64,
    ) -> RepositoryResult<bool> {
        let now = Utc::now().naive_utc();
        let rows_affected = conn.execute(
            r#"UPDATE inventory_positions
               SET qty_on_hand = qty_on_hand + ?1,
                   version = version + 1,
                   updated_at = ?2
               WHERE id = ?3 AND version = ?4 AND qty_on_hand + ?1 >= 0"#,
            params![
                delta,
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                position_id,
                expected_version,
            ],
        )?;

        Ok(rows_affected == 1)
    }

    /// 持仓列表查询 (可按托盘/物料过滤)
    pub fn list(
        &self,
        hu_id: Option<&str>,
        item_id: Option<&str>,
        limit: i64,
    ) -> RepositoryResult<Vec<InventoryPosition>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at
               FROM inventory_positions
               WHERE (?1 IS NULL OR hu_id = ?1)
                 AND (?2 IS NULL OR item_id = ?2)
               ORDER BY rowid
               LIMIT ?3"#,
        )?;

        let positions = stmt
            .query_map(params![hu_id, item_id, limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<InventoryPosition>, _>>()?;

        Ok(positions)
    }

    /// 映射数据库行到InventoryPosition对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<InventoryPosition> {
        Ok(InventoryPosition {
            id: row.get(0)?,
            hu_id: row.get(1)?,
            item_id: row.get(2)?,
            qty_on_hand: row.get(3)?,
            qty_reserved: row.get(4)?,
            version: row.get(5)?,
            updated_at: parse_datetime(6, row.get::<_, String>(6)?)?,
        })
    }
}

// ==========================================
// InventoryMovementRepository - 移动台账仓储
// ==========================================
// 台账只追加; 按插入顺序 (rowid) 排序返回
pub struct InventoryMovementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryMovementRepository {
    /// 创建新的InventoryMovementRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 生成台账ID
    pub fn next_id() -> String {
        format!("MOV_{}", Uuid::new_v4())
    }

    /// 追加台账记录
    pub fn insert(&self, movement: &InventoryMovement) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_tx(&conn, movement)
    }

    /// 追加台账记录 (事务内)
    pub fn insert_tx(conn: &Connection, movement: &InventoryMovement) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO inventory_movements (
                id, mission_line_id, movement_type, item_id,
                from_location_id, to_location_id, from_hu_id, to_hu_id,
                qty, executed_by_executor_id, executed_at, idempotency_key, reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &movement.id,
                &movement.mission_line_id,
                movement.movement_type.to_db_str(),
                &movement.item_id,
                &movement.from_location_id,
                &movement.to_location_id,
                &movement.from_hu_id,
                &movement.to_hu_id,
                &movement.qty,
                &movement.executed_by_executor_id,
                movement.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                &movement.idempotency_key,
                &movement.reason,
            ],
        )?;

        Ok(())
    }

    /// 按台账ID查询
    pub fn find_by_id(&self, movement_id: &str) -> RepositoryResult<Option<InventoryMovement>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, mission_line_id, movement_type, item_id,
                      from_location_id, to_location_id, from_hu_id, to_hu_id,
                      qty, executed_by_executor_id, executed_at, idempotency_key, reason
               FROM inventory_movements
               WHERE id = ?"#,
            params![movement_id],
            |row| Self::map_row(row),
        ) {
            Ok(movement) => Ok(Some(movement)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按幂等键查询 (重放检测; 必须发生在任何变更之前)
    pub fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> RepositoryResult<Option<InventoryMovement>> {
        let conn = self.get_conn()?;
        Self::find_by_idempotency_key_tx(&conn, key)
    }

    /// 按幂等键查询 (事务内)
    pub fn find_by_idempotency_key_tx(
        conn: &Connection,
        key: &str,
    ) -> RepositoryResult<Option<InventoryMovement>> {
        match conn.query_row(
            r#"SELECT id, mission_line_id, movement_type, item_id,
                      from_location_id, to_location_id, from_hu_id, to_hu_id,
                      qty, executed_by_executor_id, executed_at, idempotency_key, reason
               FROM inventory_movements
               WHERE idempotency_key = ?"#,
            params![key],
            |row| Self::map_row(row),
        ) {
            Ok(movement) => Ok(Some(movement)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 台账列表 (追加顺序)
    pub fn list(&self, limit: i64) -> RepositoryResult<Vec<InventoryMovement>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, mission_line_id, movement_type, item_id,
                      from_location_id, to_location_id, from_hu_id, to_hu_id,
                      qty, executed_by_executor_id, executed_at, idempotency_key, reason
               FROM inventory_movements
               ORDER BY rowid
               LIMIT ?"#,
        )?;

        let movements = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<InventoryMovement>, _>>()?;

        Ok(movements)
    }

    /// 按任务查询台账 (经行项关联, 追加顺序)
    pub fn list_for_mission(&self, mission_id: &str) -> RepositoryResult<Vec<InventoryMovement>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT m.id, m.mission_line_id, m.movement_type, m.item_id,
                      m.from_location_id, m.to_location_id, m.from_hu_id, m.to_hu_id,
                      m.qty, m.executed_by_executor_id, m.executed_at, m.idempotency_key, m.reason
               FROM inventory_movements m
               JOIN mission_lines l ON m.mission_line_id = l.id
               WHERE l.mission_id = ?
               ORDER BY m.rowid"#,
        )?;

        let movements = stmt
            .query_map(params![mission_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<InventoryMovement>, _>>()?;

        Ok(movements)
    }

    /// 映射数据库行到InventoryMovement对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<InventoryMovement> {
        let movement_type_str: String = row.get(2)?;
        Ok(InventoryMovement {
            id: row.get(0)?,
            mission_line_id: row.get(1)?,
            movement_type: MovementType::from_str(&movement_type_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    format!("未知移动类型: {}", movement_type_str).into(),
                )
            })?,
            item_id: row.get(3)?,
            from_location_id: row.get(4)?,
            to_location_id: row.get(5)?,
            from_hu_id: row.get(6)?,
            to_hu_id: row.get(7)?,
            qty: row.get(8)?,
            executed_by_executor_id: row.get(9)?,
            executed_at: parse_datetime(10, row.get::<_, String>(10)?)?,
            idempotency_key: row.get(11)?,
            reason: row.get(12)?,
        })
    }
}
