// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、基础数据播种函数
// 说明: 建表走 warehouse_wes::db::init_schema, 测试与生产共用同一份 schema
// ==========================================

use chrono::Utc;
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

use warehouse_wes::db;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 统一的时间戳文本 (与仓储层解析格式一致)
pub fn now_text() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 写入一条全局配置
pub fn insert_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
           ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value"#,
        params![key, value],
    )?;
    Ok(())
}

/// 播种库位
pub fn insert_location(
    conn: &Connection,
    id: &str,
    code: &str,
    location_type: &str,
    active: bool,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"INSERT INTO locations (id, code, name, location_type, active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        params![id, code, format!("库位 {}", code), location_type, active, now_text()],
    )?;
    Ok(())
}

/// 播种物料
pub fn insert_item(conn: &Connection, id: &str, sku: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO items (id, sku, name, uom, created_at) VALUES (?1, ?2, ?3, 'EA', ?4)",
        params![id, sku, format!("物料 {}", sku), now_text()],
    )?;
    Ok(())
}

/// 播种操作员
pub fn insert_operator(conn: &Connection, id: &str, code: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO operators (id, code, name, active, created_at) VALUES (?1, ?2, ?3, 1, ?4)",
        params![id, code, format!("操作员 {}", code), now_text()],
    )?;
    Ok(())
}

/// 播种执行者
pub fn insert_executor(
    conn: &Connection,
    id: &str,
    code: &str,
    executor_type: &str,
    max_payload_kg: f64,
    active: bool,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"INSERT INTO executors
               (id, code, name, executor_type, max_payload_kg, active, last_seen_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)"#,
        params![
            id,
            code,
            format!("执行者 {}", code),
            executor_type,
            max_payload_kg,
            active,
            now_text()
        ],
    )?;
    Ok(())
}

/// 播种托盘
pub fn insert_handling_unit(
    conn: &Connection,
    id: &str,
    hu_code: &str,
    location_id: &str,
    status: &str,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"INSERT INTO handling_units (id, hu_code, location_id, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
        params![id, hu_code, location_id, status, now_text()],
    )?;
    Ok(())
}

/// 播种库存持仓
pub fn insert_position(
    conn: &Connection,
    id: &str,
    hu_id: &str,
    item_id: &str,
    qty_on_hand: f64,
    version: i64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"INSERT INTO inventory_positions
               (id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)"#,
        params![id, hu_id, item_id, qty_on_hand, version, now_text()],
    )?;
    Ok(())
}
