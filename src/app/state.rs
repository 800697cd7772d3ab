// ==========================================
// 仓储执行系统 - 应用状态
// ==========================================
// 职责: 打开数据库, 组装 Repository/API 各层, 提供全局共享状态
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{
    ExecutorApi, HandlingUnitApi, InventoryApi, MasterDataApi, MissionApi, RuleCheckApi,
};
use crate::config::ConfigManager;
use crate::db;
use crate::importer::{MasterDataImporterImpl, MasterDataRowMapper, UniversalFileParser};
use crate::repository::{
    ExecutorRepository, HandlingUnitRepository, InventoryMovementRepository,
    InventoryPositionRepository, ItemRepository, LocationRepository, MissionRepository,
    OperatorRepository,
};

/// 应用状态
///
/// 持有数据库路径与各 API 单例, 由进程入口创建一次后共享。
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 任务 API
    pub mission_api: Arc<MissionApi>,

    /// 库存 API
    pub inventory_api: Arc<InventoryApi>,

    /// 托盘 API
    pub handling_unit_api: Arc<HandlingUnitApi>,

    /// 执行者 API
    pub executor_api: Arc<ExecutorApi>,

    /// 主数据 API
    pub master_data_api: Arc<MasterDataApi>,

    /// 规则预检 API
    pub rule_check_api: Arc<RuleCheckApi>,

    /// 主数据导入器
    pub importer: Arc<MasterDataImporterImpl<ConfigManager>>,
}

impl AppState {
    /// 初始化应用状态
    ///
    /// 打开(或创建)SQLite 数据库并建表, 然后自底向上组装各层。
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化应用状态, 数据库路径: {}", db_path);

        // ==========================================
        // 初始化数据库连接
        // ==========================================
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("打开数据库失败: {}", e))?;
        db::init_schema(&conn).map_err(|e| format!("初始化数据库结构失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let mission_repo = Arc::new(MissionRepository::new(conn.clone()));
        let executor_repo = Arc::new(ExecutorRepository::new(conn.clone()));
        let handling_unit_repo = Arc::new(HandlingUnitRepository::new(conn.clone()));
        let position_repo = Arc::new(InventoryPositionRepository::new(conn.clone()));
        let movement_repo = Arc::new(InventoryMovementRepository::new(conn.clone()));
        let item_repo = Arc::new(ItemRepository::new(conn.clone()));
        let location_repo = Arc::new(LocationRepository::new(conn.clone()));
        let operator_repo = Arc::new(OperatorRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("初始化配置管理器失败: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let mission_api = Arc::new(MissionApi::new(
            conn.clone(),
            mission_repo.clone(),
            executor_repo.clone(),
            location_repo.clone(),
            handling_unit_repo.clone(),
            movement_repo.clone(),
            config_manager.clone(),
        ));

        let inventory_api = Arc::new(InventoryApi::new(
            conn.clone(),
            position_repo.clone(),
            movement_repo.clone(),
            config_manager.clone(),
        ));

        let handling_unit_api = Arc::new(HandlingUnitApi::new(
            handling_unit_repo.clone(),
            location_repo.clone(),
            config_manager.clone(),
        ));

        let executor_api = Arc::new(ExecutorApi::new(
            executor_repo.clone(),
            config_manager.clone(),
        ));

        let master_data_api = Arc::new(MasterDataApi::new(
            item_repo.clone(),
            location_repo.clone(),
            operator_repo.clone(),
            config_manager.clone(),
        ));

        let rule_check_api = Arc::new(RuleCheckApi::new(
            mission_repo.clone(),
            executor_repo.clone(),
            location_repo.clone(),
            handling_unit_repo.clone(),
        ));

        // ==========================================
        // 初始化导入器
        // ==========================================
        let importer_config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("初始化导入配置失败: {}", e))?;
        let importer = Arc::new(MasterDataImporterImpl::new(
            conn.clone(),
            importer_config,
            Box::new(UniversalFileParser),
            Box::new(MasterDataRowMapper),
        ));

        tracing::info!("应用状态初始化完成");

        Ok(Self {
            db_path,
            mission_api,
            inventory_api,
            handling_unit_api,
            executor_api,
            master_data_api,
            rule_check_api,
            importer,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 WAREHOUSE_WES_DB_PATH > 系统数据目录 > 当前目录。
/// 调试构建使用带 -dev 后缀的独立目录, 避免污染正式数据。
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("WAREHOUSE_WES_DB_PATH") {
        if !path.trim().is_empty() {
            return path;
        }
    }

    #[cfg(debug_assertions)]
    let app_dir_name = "warehouse-wes-dev";
    #[cfg(not(debug_assertions))]
    let app_dir_name = "warehouse-wes";

    let base_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let app_dir = base_dir.join(app_dir_name);
    std::fs::create_dir_all(&app_dir).ok();

    app_dir
        .join("warehouse_wes.db")
        .to_string_lossy()
        .to_string()
}
