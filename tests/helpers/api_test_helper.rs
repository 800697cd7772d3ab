// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用环境装配与基础场景播种
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use warehouse_wes::api::{
    ExecutorApi, HandlingUnitApi, InventoryApi, MasterDataApi, MissionApi, RuleCheckApi,
};
use warehouse_wes::config::ConfigManager;
use warehouse_wes::repository::{
    ExecutorRepository, HandlingUnitRepository, InventoryMovementRepository,
    InventoryPositionRepository, ItemRepository, LocationRepository, MissionRepository,
    OperatorRepository,
};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,

    pub mission_api: Arc<MissionApi>,
    pub inventory_api: Arc<InventoryApi>,
    pub handling_unit_api: Arc<HandlingUnitApi>,
    pub executor_api: Arc<ExecutorApi>,
    pub master_data_api: Arc<MasterDataApi>,
    pub rule_check_api: Arc<RuleCheckApi>,

    // Repository层（用于测试数据准备）
    pub mission_repo: Arc<MissionRepository>,
    pub executor_repo: Arc<ExecutorRepository>,
    pub handling_unit_repo: Arc<HandlingUnitRepository>,
    pub position_repo: Arc<InventoryPositionRepository>,
    pub movement_repo: Arc<InventoryMovementRepository>,
    pub item_repo: Arc<ItemRepository>,
    pub location_repo: Arc<LocationRepository>,
    pub operator_repo: Arc<OperatorRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

/// 基础仓库场景的实体ID集合
///
/// 两个库位、两个在位托盘、一条 100 的起始持仓, 足以覆盖大多数移动场景。
pub struct SeededWarehouse {
    pub operator_id: String,
    pub human_executor_id: String,
    pub agv_executor_id: String,
    pub source_location_id: String,
    pub dest_location_id: String,
    pub item_id: String,
    pub second_item_id: String,
    pub from_hu_id: String,
    pub to_hu_id: String,
    pub source_position_id: String,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件, schema 与生产一致
    /// - 初始化所有Repository和API
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let conn = warehouse_wes::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
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

        Ok(Self {
            db_path,
            conn,
            mission_api,
            inventory_api,
            handling_unit_api,
            executor_api,
            master_data_api,
            rule_check_api,
            mission_repo,
            executor_repo,
            handling_unit_repo,
            position_repo,
            movement_repo,
            item_repo,
            location_repo,
            operator_repo,
            _temp_file: temp_file,
        })
    }

    /// 播种基础仓库场景
    ///
    /// 布局: BULK 起点库位放 HU_T01 (物料 ITM_T01 持仓 100),
    ///       STAGING 终点库位放 HU_T02 (空)。
    pub fn seed_basic_warehouse(&self) -> Result<SeededWarehouse, String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("数据库锁获取失败: {}", e))?;

        test_helpers::insert_operator(&conn, "OPR_T01", "OP-T01").map_err(|e| e.to_string())?;
        test_helpers::insert_executor(&conn, "EXE_T01", "PICKER-T01", "HUMAN", 80.0, true)
            .map_err(|e| e.to_string())?;
        test_helpers::insert_executor(&conn, "EXE_T02", "AGV-T01", "AGV", 1200.0, true)
            .map_err(|e| e.to_string())?;
        test_helpers::insert_location(&conn, "LOC_T01", "BULK-T01", "BULK", true)
            .map_err(|e| e.to_string())?;
        test_helpers::insert_location(&conn, "LOC_T02", "STAGE-T01", "STAGING", true)
            .map_err(|e| e.to_string())?;
        test_helpers::insert_item(&conn, "ITM_T01", "SKU-T0001").map_err(|e| e.to_string())?;
        test_helpers::insert_item(&conn, "ITM_T02", "SKU-T0002").map_err(|e| e.to_string())?;
        test_helpers::insert_handling_unit(&conn, "HU_T01", "PAL-T001", "LOC_T01", "OPEN")
            .map_err(|e| e.to_string())?;
        test_helpers::insert_handling_unit(&conn, "HU_T02", "PAL-T002", "LOC_T02", "OPEN")
            .map_err(|e| e.to_string())?;
        test_helpers::insert_position(&conn, "POS_T01", "HU_T01", "ITM_T01", 100.0, 1)
            .map_err(|e| e.to_string())?;

        Ok(SeededWarehouse {
            operator_id: "OPR_T01".to_string(),
            human_executor_id: "EXE_T01".to_string(),
            agv_executor_id: "EXE_T02".to_string(),
            source_location_id: "LOC_T01".to_string(),
            dest_location_id: "LOC_T02".to_string(),
            item_id: "ITM_T01".to_string(),
            second_item_id: "ITM_T02".to_string(),
            from_hu_id: "HU_T01".to_string(),
            to_hu_id: "HU_T02".to_string(),
            source_position_id: "POS_T01".to_string(),
        })
    }
}
