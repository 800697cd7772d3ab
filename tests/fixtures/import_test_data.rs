// 通过导入器把 CSV 测试数据集灌入数据库
use std::error::Error;
use std::path::Path;

use warehouse_wes::app::get_default_db_path;
use warehouse_wes::config::ConfigManager;
use warehouse_wes::db;
use warehouse_wes::importer::{
    MasterDataImporter, MasterDataImporterImpl, MasterDataRowMapper, UniversalFileParser,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("开始导入测试数据到数据库...");

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    println!("目标数据库: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;
    let conn = std::sync::Arc::new(std::sync::Mutex::new(conn));

    let importer = MasterDataImporterImpl::new(
        conn.clone(),
        ConfigManager::from_connection(conn.clone())?,
        Box::new(UniversalFileParser),
        Box::new(MasterDataRowMapper),
    );

    let item_files = ["tests/fixtures/datasets/01_items_normal.csv"];
    let location_files = ["tests/fixtures/datasets/04_locations_normal.csv"];

    for path in item_files {
        if !Path::new(path).exists() {
            println!("! 跳过缺失文件 {} (先运行 generate_test_data)", path);
            continue;
        }
        let summary = importer.import_items(path).await?;
        println!(
            "✓ {} -> 新增 {} 更新 {} 失败 {}",
            path,
            summary.inserted,
            summary.updated,
            summary.errors.len()
        );
    }

    for path in location_files {
        if !Path::new(path).exists() {
            println!("! 跳过缺失文件 {} (先运行 generate_test_data)", path);
            continue;
        }
        let summary = importer.import_locations(path).await?;
        println!(
            "✓ {} -> 新增 {} 更新 {} 失败 {}",
            path,
            summary.inserted,
            summary.updated,
            summary.errors.len()
        );
    }

    let item_count: i64 = {
        let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?
    };
    let location_count: i64 = {
        let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?
    };

    println!("✓ 数据导入完成！");
    println!("  - 物料总数: {}", item_count);
    println!("  - 库位总数: {}", location_count);

    Ok(())
}
