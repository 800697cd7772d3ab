// ==========================================
// 仓储执行系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中维护建表 DDL（含约束与索引），测试与生产共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

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
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
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

/// 初始化数据库 schema（幂等）
///
/// 所有表、约束与索引集中在此维护：
/// - 引用数据: items / locations / operators / executors / handling_units
/// - 任务: missions / mission_lines
/// - 台账: inventory_positions / inventory_movements
/// - 配置: config_kv
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            uom TEXT NOT NULL DEFAULT 'EA',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS locations (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            location_type TEXT NOT NULL DEFAULT 'BULK',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS operators (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS executors (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            executor_type TEXT NOT NULL DEFAULT 'HUMAN',
            max_payload_kg REAL NOT NULL DEFAULT 500,
            active INTEGER NOT NULL DEFAULT 1,
            last_seen_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS handling_units (
            id TEXT PRIMARY KEY,
            hu_code TEXT NOT NULL UNIQUE,
            location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE RESTRICT,
            status TEXT NOT NULL DEFAULT 'OPEN',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_handling_units_location
            ON handling_units(location_id);

        CREATE TABLE IF NOT EXISTS missions (
            id TEXT PRIMARY KEY,
            mission_no TEXT NOT NULL UNIQUE,
            mission_type TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'DRAFT',
            priority INTEGER NOT NULL DEFAULT 0 CHECK (priority >= 0),
            created_by_operator_id TEXT NOT NULL REFERENCES operators(id) ON DELETE RESTRICT,
            assigned_executor_id TEXT REFERENCES executors(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT,
            cancel_reason TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_missions_state ON missions(state);

        CREATE TABLE IF NOT EXISTS mission_lines (
            id TEXT PRIMARY KEY,
            mission_id TEXT NOT NULL REFERENCES missions(id) ON DELETE CASCADE,
            from_location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE RESTRICT,
            to_location_id TEXT NOT NULL REFERENCES locations(id) ON DELETE RESTRICT,
            item_id TEXT REFERENCES items(id) ON DELETE RESTRICT,
            hu_id TEXT REFERENCES handling_units(id) ON DELETE RESTRICT,
            qty REAL NOT NULL CHECK (qty > 0),
            qty_done REAL NOT NULL DEFAULT 0
                CHECK (qty_done >= 0 AND qty_done <= qty),
            CHECK (item_id IS NOT NULL OR hu_id IS NOT NULL),
            CHECK (from_location_id != to_location_id)
        );

        CREATE INDEX IF NOT EXISTS idx_mission_lines_mission
            ON mission_lines(mission_id);

        CREATE TABLE IF NOT EXISTS inventory_positions (
            id TEXT PRIMARY KEY,
            hu_id TEXT NOT NULL REFERENCES handling_units(id) ON DELETE CASCADE,
            item_id TEXT NOT NULL REFERENCES items(id) ON DELETE RESTRICT,
            qty_on_hand REAL NOT NULL DEFAULT 0 CHECK (qty_on_hand >= 0),
            qty_reserved REAL NOT NULL DEFAULT 0
                CHECK (qty_reserved >= 0 AND qty_reserved <= qty_on_hand),
            version INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
            updated_at TEXT NOT NULL,
            UNIQUE (hu_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS inventory_movements (
            id TEXT PRIMARY KEY,
            mission_line_id TEXT REFERENCES mission_lines(id) ON DELETE SET NULL,
            movement_type TEXT NOT NULL DEFAULT 'MOVE',
            item_id TEXT REFERENCES items(id) ON DELETE RESTRICT,
            from_location_id TEXT REFERENCES locations(id) ON DELETE RESTRICT,
            to_location_id TEXT REFERENCES locations(id) ON DELETE RESTRICT,
            from_hu_id TEXT REFERENCES handling_units(id) ON DELETE RESTRICT,
            to_hu_id TEXT REFERENCES handling_units(id) ON DELETE RESTRICT,
            qty REAL NOT NULL CHECK (qty > 0),
            executed_by_executor_id TEXT REFERENCES executors(id) ON DELETE SET NULL,
            executed_at TEXT NOT NULL,
            idempotency_key TEXT UNIQUE,
            reason TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_inventory_movements_line
            ON inventory_movements(mission_line_id);
        "#,
    )?;

    // 记录 schema 版本（幂等）
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
