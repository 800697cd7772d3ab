// ==========================================
// 仓储执行系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 仓储执行层 (任务驱动的库存移动与台账记录)
// ==========================================

use warehouse_wes::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    warehouse_wes::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", warehouse_wes::APP_NAME);
    tracing::info!("系统版本: {}", warehouse_wes::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = AppState::new(db_path).expect("无法初始化AppState");

    // 启动自检: 各主数据表可读
    let locations = app_state
        .master_data_api
        .list_locations(None)
        .expect("读取库位失败");
    let items = app_state
        .master_data_api
        .list_items(None)
        .expect("读取物料失败");
    let executors = app_state
        .executor_api
        .list_executors(None, None)
        .expect("读取执行者失败");
    let missions = app_state
        .mission_api
        .list_missions(None, None)
        .expect("读取任务失败");

    tracing::info!(
        locations = locations.len(),
        items = items.len(),
        executors = executors.len(),
        missions = missions.len(),
        "数据库自检完成"
    );
    tracing::info!("初始化完成, 以库模式对外提供 API");
}
