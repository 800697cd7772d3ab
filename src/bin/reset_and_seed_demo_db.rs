// 重置并灌入演示场景数据
//
// 用法: reset_and_seed_demo_db [db_path]
// 已存在的数据库会先备份为 <db_path>.bak.<时间戳> 再重建。
use chrono::{Duration, Local, Utc};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fs;
use std::path::Path;

use warehouse_wes::app::get_default_db_path;
use warehouse_wes::db;

const DEFAULT_ITEM_COUNT: usize = 40;
const DEFAULT_HU_PER_LOCATION: usize = 2;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    seed_demo_scenario(&conn)?;
    print_quick_counts(&conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("已备份 {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo_scenario(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();

    // 场景1: 库位 (每种类型若干)
    println!("生成场景1: 库位...");
    let location_specs = [
        ("LOC-PICK-01", "拣选位 01", "PICK"),
        ("LOC-PICK-02", "拣选位 02", "PICK"),
        ("LOC-BULK-01", "存储位 01", "BULK"),
        ("LOC-BULK-02", "存储位 02", "BULK"),
        ("LOC-STAGE-01", "集货位 01", "STAGING"),
        ("LOC-DOCK-01", "月台 01", "DOCK"),
    ];
    for (code, name, location_type) in location_specs {
        conn.execute(
            "INSERT INTO locations (id, code, name, location_type, active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![format!("LOC_{}", code), code, name, location_type, now],
        )?;
    }

    // 场景2: 物料
    println!("生成场景2: 物料 ({}条)...", DEFAULT_ITEM_COUNT);
    for i in 0..DEFAULT_ITEM_COUNT {
        let sku = format!("SKU{:06}", i + 1);
        conn.execute(
            "INSERT INTO items (id, sku, name, uom, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                format!("ITM_{}", sku),
                sku,
                format!("演示物料 {:06}", i + 1),
                ["EA", "BOX", "KG", "PAL"][i % 4],
                now,
            ],
        )?;
    }

    // 场景3: 操作员与执行者
    println!("生成场景3: 操作员与执行者...");
    conn.execute(
        "INSERT INTO operators (id, code, name, active, created_at)
         VALUES ('OPR_SEED01', 'OP-001', '演示操作员', 1, ?1)",
        params![now],
    )?;
    let executor_specs = [
        ("EXE_SEED01", "PICKER-01", "拣选员 01", "HUMAN", 80.0),
        ("EXE_SEED02", "PICKER-02", "拣选员 02", "HUMAN", 80.0),
        ("EXE_SEED03", "AGV-01", "搬运车 01", "AGV", 1200.0),
        ("EXE_SEED04", "AGV-02", "搬运车 02", "AGV", 1500.0),
    ];
    for (id, code, name, executor_type, payload) in executor_specs {
        conn.execute(
            "INSERT INTO executors
                 (id, code, name, executor_type, max_payload_kg, active, last_seen_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
            params![id, code, name, executor_type, payload, now],
        )?;
    }

    // 场景4: 托盘与库存
    println!("生成场景4: 托盘与库存...");
    let mut hu_index = 0usize;
    for &(code, _name, _ty) in location_specs.iter().take(4) {
        for _slot in 0..DEFAULT_HU_PER_LOCATION {
            hu_index += 1;
            let hu_id = format!("HU_SEED{:03}", hu_index);
            conn.execute(
                "INSERT INTO handling_units (id, hu_code, location_id, status, created_at)
                 VALUES (?1, ?2, ?3, 'OPEN', ?4)",
                params![
                    hu_id,
                    format!("PAL-{:04}", hu_index),
                    format!("LOC_{}", code),
                    now,
                ],
            )?;

            // 每个托盘放两种物料
            for offset in 0..2usize {
                let sku_no = (hu_index * 2 + offset) % DEFAULT_ITEM_COUNT + 1;
                conn.execute(
                    "INSERT INTO inventory_positions
                         (id, hu_id, item_id, qty_on_hand, qty_reserved, version, updated_at)
                     VALUES (?1, ?2, ?3, ?4, 0, 1, ?5)",
                    params![
                        format!("POS_SEED{:03}_{}", hu_index, offset),
                        hu_id,
                        format!("ITM_SKU{:06}", sku_no),
                        (50 + hu_index * 10) as f64,
                        now,
                    ],
                )?;
            }
        }
    }

    // 场景5: 各状态任务
    println!("生成场景5: 任务...");
    let yesterday = (Utc::now().naive_utc() - Duration::days(1))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let mission_specs: [(&str, &str, &str, &str, Option<&str>); 4] = [
        ("MIS_SEED01", "MSN-0001", "MOVE_ITEM", "DRAFT", None),
        ("MIS_SEED02", "MSN-0002", "MOVE_ITEM", "ASSIGNED", Some("EXE_SEED01")),
        ("MIS_SEED03", "MSN-0003", "MOVE_HU", "IN_PROGRESS", Some("EXE_SEED03")),
        ("MIS_SEED04", "MSN-0004", "MOVE_ITEM", "COMPLETED", Some("EXE_SEED02")),
    ];
    for (id, mission_no, mission_type, state, executor) in mission_specs {
        let started_at = match state {
            "IN_PROGRESS" | "COMPLETED" => Some(yesterday.as_str()),
            _ => None,
        };
        let completed_at = match state {
            "COMPLETED" => Some(now.as_str()),
            _ => None,
        };
        conn.execute(
            "INSERT INTO missions
                 (id, mission_no, mission_type, state, priority, created_by_operator_id,
                  assigned_executor_id, created_at, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, 5, 'OPR_SEED01', ?5, ?6, ?7, ?8)",
            params![id, mission_no, mission_type, state, executor, yesterday, started_at, completed_at],
        )?;
    }

    let line_specs: [(&str, &str, &str, Option<&str>, Option<&str>, f64, f64); 4] = [
        ("LINE_SEED01", "MIS_SEED01", "LOC_LOC-BULK-01", Some("ITM_SKU000001"), None, 30.0, 0.0),
        ("LINE_SEED02", "MIS_SEED02", "LOC_LOC-BULK-01", Some("ITM_SKU000003"), None, 20.0, 0.0),
        // HU_SEED001 落在 LOC-PICK-01, 整托移动行的起点必须与之一致
        ("LINE_SEED03", "MIS_SEED03", "LOC_LOC-PICK-01", None, Some("HU_SEED001"), 1.0, 0.0),
        ("LINE_SEED04", "MIS_SEED04", "LOC_LOC-BULK-02", Some("ITM_SKU000005"), None, 10.0, 10.0),
    ];
    for (id, mission_id, from_location_id, item_id, hu_id, qty, qty_done) in line_specs {
        conn.execute(
            "INSERT INTO mission_lines
                 (id, mission_id, from_location_id, to_location_id, item_id, hu_id, qty, qty_done)
             VALUES (?1, ?2, ?3, 'LOC_LOC-STAGE-01', ?4, ?5, ?6, ?7)",
            params![id, mission_id, from_location_id, item_id, hu_id, qty, qty_done],
        )?;
    }

    println!("✓ 演示场景数据生成完成");
    Ok(())
}

fn print_quick_counts(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tables = [
        "locations",
        "items",
        "operators",
        "executors",
        "handling_units",
        "inventory_positions",
        "missions",
        "mission_lines",
    ];
    for table in tables {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        println!("  {} = {}", table, count);
    }
    Ok(())
}
