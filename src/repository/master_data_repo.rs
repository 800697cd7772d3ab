// ==========================================
// 仓储执行系统 - 引用数据仓储
// ==========================================
// 职责: 物料 (items) / 库位 (locations) / 操作员 (operators) 的数据访问
// 红线: Repository 不含业务逻辑
// 说明: upsert_*_tx 系列供批量导入在单事务内逐行调用,
//       返回 true=新插入 / false=按唯一编码覆盖更新
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::master_data::{Item, Location, Operator};
use crate::domain::types::LocationType;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 解析仓储层统一的时间戳格式
fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// ItemRepository - 物料仓储
// ==========================================
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    /// 创建新的ItemRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建物料; SKU 冲突以 UniqueConstraintViolation 上抛
    pub fn create(&self, sku: &str, name: &str, uom: &str) -> RepositoryResult<Item> {
        let conn = self.get_conn()?;
        let item = Item {
            id: format!("ITM_{}", Uuid::new_v4()),
            sku: sku.to_string(),
            name: name.to_string(),
            uom: uom.to_string(),
            created_at: Utc::now().naive_utc(),
        };

        conn.execute(
            "INSERT INTO items (id, sku, name, uom, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                &item.id,
                &item.sku,
                &item.name,
                &item.uom,
                item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(item)
    }

    /// 按物料ID查询
    pub fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT id, sku, name, uom, created_at FROM items WHERE id = ?",
            params![item_id],
            |row| Self::map_row(row),
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按SKU查询
    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        Self::find_by_sku_tx(&conn, sku)
    }

    /// 按SKU查询 (事务内)
    pub fn find_by_sku_tx(conn: &Connection, sku: &str) -> RepositoryResult<Option<Item>> {
        match conn.query_row(
            "SELECT id, sku, name, uom, created_at FROM items WHERE sku = ?",
            params![sku],
            |row| Self::map_row(row),
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 物料列表 (创建顺序)
    pub fn list(&self, limit: i64) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, sku, name, uom, created_at FROM items ORDER BY rowid LIMIT ?",
        )?;

        let items = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<Item>, _>>()?;

        Ok(items)
    }

    /// 按SKU写入或覆盖 (事务内, 批量导入用)
    pub fn upsert_by_sku_tx(
        conn: &Connection,
        sku: &str,
        name: &str,
        uom: &str,
    ) -> RepositoryResult<bool> {
        if Self::find_by_sku_tx(conn, sku)?.is_some() {
            conn.execute(
                "UPDATE items SET name = ?, uom = ? WHERE sku = ?",
                params![name, uom, sku],
            )?;
            return Ok(false);
        }

        conn.execute(
            "INSERT INTO items (id, sku, name, uom, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                format!("ITM_{}", Uuid::new_v4()),
                sku,
                name,
                uom,
                Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(true)
    }

    /// 映射数据库行到Item对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            sku: row.get(1)?,
            name: row.get(2)?,
            uom: row.get(3)?,
            created_at: parse_datetime(4, row.get::<_, String>(4)?)?,
        })
    }
}

// ==========================================
// LocationRepository - 库位仓储
// ==========================================
pub struct LocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LocationRepository {
    /// 创建新的LocationRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建库位; code 冲突以 UniqueConstraintViolation 上抛
    pub fn create(
        &self,
        code: &str,
        name: &str,
        location_type: LocationType,
        active: bool,
    ) -> RepositoryResult<Location> {
        let conn = self.get_conn()?;
        let location = Location {
            id: format!("LOC_{}", Uuid::new_v4()),
            code: code.to_string(),
            name: name.to_string(),
            location_type,
            active,
            created_at: Utc::now().naive_utc(),
        };

        conn.execute(
            r#"INSERT INTO locations (id, code, name, location_type, active, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &location.id,
                &location.code,
                &location.name,
                location.location_type.to_db_str(),
                &location.active,
                location.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(location)
    }

    /// 按库位ID查询
    pub fn find_by_id(&self, location_id: &str) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, location_id)
    }

    /// 按库位ID查询 (事务内)
    pub fn find_by_id_tx(
        conn: &Connection,
        location_id: &str,
    ) -> RepositoryResult<Option<Location>> {
        match conn.query_row(
            "SELECT id, code, name, location_type, active, created_at FROM locations WHERE id = ?",
            params![location_id],
            |row| Self::map_row(row),
        ) {
            Ok(location) => Ok(Some(location)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按库位编码查询
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Location>> {
        let conn = self.get_conn()?;
        Self::find_by_code_tx(&conn, code)
    }

    /// 按库位编码查询 (事务内)
    pub fn find_by_code_tx(conn: &Connection, code: &str) -> RepositoryResult<Option<Location>> {
        match conn.query_row(
            "SELECT id, code, name, location_type, active, created_at FROM locations WHERE code = ?",
            params![code],
            |row| Self::map_row(row),
        ) {
            Ok(location) => Ok(Some(location)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 库位列表 (创建顺序)
    pub fn list(&self, limit: i64) -> RepositoryResult<Vec<Location>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, code, name, location_type, active, created_at FROM locations ORDER BY rowid LIMIT ?",
        )?;

        let locations = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<Location>, _>>()?;

        Ok(locations)
    }

    /// 部分更新 (None 字段保持原值)
    pub fn update(
        &self,
        location_id: &str,
        name: Option<&str>,
        location_type: Option<LocationType>,
        active: Option<bool>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"UPDATE locations
               SET name = COALESCE(?, name),
                   location_type = COALESCE(?, location_type),
                   active = COALESCE(?, active)
               WHERE id = ?"#,
            params![
                name,
                location_type.map(|t| t.to_db_str()),
                active,
                location_id
            ],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Location".to_string(),
                id: location_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按编码写入或覆盖 (事务内, 批量导入用)
    pub fn upsert_by_code_tx(
        conn: &Connection,
        code: &str,
        name: &str,
        location_type: LocationType,
        active: bool,
    ) -> RepositoryResult<bool> {
        if Self::find_by_code_tx(conn, code)?.is_some() {
            conn.execute(
                "UPDATE locations SET name = ?, location_type = ?, active = ? WHERE code = ?",
                params![name, location_type.to_db_str(), active, code],
            )?;
            return Ok(false);
        }

        conn.execute(
            r#"INSERT INTO locations (id, code, name, location_type, active, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                format!("LOC_{}", Uuid::new_v4()),
                code,
                name,
                location_type.to_db_str(),
                active,
                Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(true)
    }

    /// 映射数据库行到Location对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Location> {
        let type_str: String = row.get(3)?;
        Ok(Location {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            location_type: LocationType::from_str(&type_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    format!("未知库位类型: {}", type_str).into(),
                )
            })?,
            active: row.get(4)?,
            created_at: parse_datetime(5, row.get::<_, String>(5)?)?,
        })
    }
}

// ==========================================
// OperatorRepository - 操作员仓储
// ==========================================
pub struct OperatorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperatorRepository {
    /// 创建新的OperatorRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建操作员; code 冲突以 UniqueConstraintViolation 上抛
    pub fn create(&self, code: &str, name: &str, active: bool) -> RepositoryResult<Operator> {
        let conn = self.get_conn()?;
        let operator = Operator {
            id: format!("OPR_{}", Uuid::new_v4()),
            code: code.to_string(),
            name: name.to_string(),
            active,
            created_at: Utc::now().naive_utc(),
        };

        conn.execute(
            "INSERT INTO operators (id, code, name, active, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                &operator.id,
                &operator.code,
                &operator.name,
                &operator.active,
                operator.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(operator)
    }

    /// 按操作员ID查询
    pub fn find_by_id(&self, operator_id: &str) -> RepositoryResult<Option<Operator>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT id, code, name, active, created_at FROM operators WHERE id = ?",
            params![operator_id],
            |row| Self::map_row(row),
        ) {
            Ok(operator) => Ok(Some(operator)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 操作员列表 (创建顺序)
    pub fn list(&self, limit: i64) -> RepositoryResult<Vec<Operator>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, code, name, active, created_at FROM operators ORDER BY rowid LIMIT ?",
        )?;

        let operators = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<Operator>, _>>()?;

        Ok(operators)
    }

    /// 部分更新 (None 字段保持原值)
    pub fn update(
        &self,
        operator_id: &str,
        name: Option<&str>,
        active: Option<bool>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"UPDATE operators
               SET name = COALESCE(?, name),
                   active = COALESCE(?, active)
               WHERE id = ?"#,
            params![name, active, operator_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Operator".to_string(),
                id: operator_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到Operator对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Operator> {
        Ok(Operator {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            active: row.get(3)?,
            created_at: parse_datetime(4, row.get::<_, String>(4)?)?,
        })
    }
}
