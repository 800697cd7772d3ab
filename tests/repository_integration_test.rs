// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 验证仓储层在外键/约束开启下的持久化语义
// 覆盖: 事务原子性 / 复合键唯一 / 版本 CAS / 行更新零命中
// ==========================================

mod test_helpers;

#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use test_data_builder::{MissionBuilder, MissionLineBuilder};
use warehouse_wes::domain::inventory::InventoryMovement;
use warehouse_wes::domain::types::{ExecutorType, MissionState, MovementType};
use warehouse_wes::logging;
use warehouse_wes::repository::{
    ExecutorRepository, HandlingUnitRepository, InventoryMovementRepository,
    InventoryPositionRepository, ItemRepository, MissionRepository, RepositoryError,
};

// ==========================================
// 测试辅助函数
// ==========================================

/// 创建带 schema 的测试库并打开共享连接
fn setup() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let conn = Arc::new(Mutex::new(
        warehouse_wes::db::open_sqlite_connection(&db_path).expect("Failed to open db"),
    ));
    (temp_file, conn)
}

/// 预置被外键引用的基础档案
fn seed_reference_data(conn: &Arc<Mutex<Connection>>) {
    let conn = conn.lock().unwrap();
    test_helpers::insert_operator(&conn, "OPR_T01", "OP-T01").unwrap();
    test_helpers::insert_location(&conn, "LOC_A", "BULK-A", "BULK", true).unwrap();
    test_helpers::insert_location(&conn, "LOC_B", "STAGE-B", "STAGING", true).unwrap();
    test_helpers::insert_item(&conn, "ITM_A", "SKU-A001").unwrap();
    test_helpers::insert_executor(&conn, "EXE_A", "PICKER-A", "HUMAN", 80.0, true).unwrap();
    test_helpers::insert_handling_unit(&conn, "HU_A", "PAL-A01", "LOC_A", "OPEN").unwrap();
    test_helpers::insert_handling_unit(&conn, "HU_B", "PAL-B01", "LOC_B", "OPEN").unwrap();
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_create_with_lines_is_atomic() {
    logging::init_test();
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let mission_repo = MissionRepository::new(conn.clone());

    // 第二个行项违反 qty > 0 约束, 任务头与首行必须一并回滚
    let mission = MissionBuilder::new("MIS_A").build();
    let lines = vec![
        MissionLineBuilder::new("LINE_A1", "MIS_A")
            .route("LOC_A", "LOC_B")
            .item("ITM_A")
            .qty(50.0)
            .build(),
        MissionLineBuilder::new("LINE_A2", "MIS_A")
            .route("LOC_A", "LOC_B")
            .item("ITM_A")
            .qty(-5.0)
            .build(),
    ];
    assert!(mission_repo.create_with_lines(&mission, &lines).is_err());
    assert!(mission_repo.find_by_id("MIS_A").unwrap().is_none());
    assert!(mission_repo.lines_for_mission("MIS_A").unwrap().is_empty());

    // 全部行项合法时整体落库
    let mission = MissionBuilder::new("MIS_B").build();
    let lines = vec![
        MissionLineBuilder::new("LINE_B1", "MIS_B")
            .route("LOC_A", "LOC_B")
            .item("ITM_A")
            .qty(50.0)
            .build(),
        MissionLineBuilder::new("LINE_B2", "MIS_B")
            .route("LOC_A", "LOC_B")
            .handling_unit("HU_A")
            .qty(1.0)
            .build(),
    ];
    mission_repo.create_with_lines(&mission, &lines).unwrap();
    let stored = mission_repo.find_with_lines("MIS_B").unwrap().unwrap();
    assert_eq!(stored.mission.state, MissionState::Draft);
    assert_eq!(stored.lines.len(), 2);
}

#[test]
fn test_mission_row_updates_require_existing_row() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let mission_repo = MissionRepository::new(conn.clone());

    // 零命中的 UPDATE 必须上抛 NotFound 而非静默成功
    let err = mission_repo.mark_assigned("MIS_NOPE", "EXE_A").unwrap_err();
    match err {
        RepositoryError::NotFound { entity, id } => {
            assert_eq!(entity, "Mission");
            assert_eq!(id, "MIS_NOPE");
        }
        other => panic!("期望 NotFound, 实际 {:?}", other),
    }
    assert!(matches!(
        mission_repo.mark_started("MIS_NOPE"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        mission_repo.update_priority("MIS_NOPE", 5),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        mission_repo.mark_completed("MIS_NOPE"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        mission_repo.mark_cancelled("MIS_NOPE", "库位盘点"),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_line_qty_done_accumulates_in_tx() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let mission_repo = MissionRepository::new(conn.clone());

    let mission = MissionBuilder::new("MIS_C").build();
    let lines = vec![MissionLineBuilder::new("LINE_C1", "MIS_C")
        .route("LOC_A", "LOC_B")
        .item("ITM_A")
        .qty(50.0)
        .build()];
    mission_repo.create_with_lines(&mission, &lines).unwrap();

    {
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        MissionRepository::increment_line_qty_done_tx(&tx, "LINE_C1", 20.0).unwrap();
        MissionRepository::increment_line_qty_done_tx(&tx, "LINE_C1", 20.0).unwrap();
        assert!(matches!(
            MissionRepository::increment_line_qty_done_tx(&tx, "LINE_NOPE", 1.0),
            Err(RepositoryError::NotFound { .. })
        ));
        tx.commit().unwrap();
    }

    let line = mission_repo.find_line_by_id("LINE_C1").unwrap().unwrap();
    assert_eq!(line.qty_done, 40.0);
}

#[test]
fn test_position_pair_uniqueness_and_version_cas() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let position_repo = InventoryPositionRepository::new(conn.clone());

    let position = position_repo.create("HU_A", "ITM_A", 100.0).unwrap();
    assert_eq!(position.version, 1);
    assert_eq!(position.qty_on_hand, 100.0);

    // (托盘, 物料) 复合键唯一
    let err = position_repo.create("HU_A", "ITM_A", 1.0).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

    // 复合键查询: 不存在是合法的 None
    assert!(position_repo.find_by_pair("HU_A", "ITM_A").unwrap().is_some());
    assert!(position_repo.find_by_pair("HU_B", "ITM_A").unwrap().is_none());

    // 版本匹配时扣减并递增版本
    assert!(position_repo
        .apply_delta_if_version(&position.id, 1, -30.0)
        .unwrap());
    let current = position_repo.find_by_id(&position.id).unwrap().unwrap();
    assert_eq!(current.qty_on_hand, 70.0);
    assert_eq!(current.version, 2);

    // 过期版本整体落空
    assert!(!position_repo
        .apply_delta_if_version(&position.id, 1, -30.0)
        .unwrap());
    // 版本正确但余额会变负, 同样落空
    assert!(!position_repo
        .apply_delta_if_version(&position.id, 2, -100.0)
        .unwrap());
    let current = position_repo.find_by_id(&position.id).unwrap().unwrap();
    assert_eq!(current.qty_on_hand, 70.0);
    assert_eq!(current.version, 2);
}

#[test]
fn test_item_upsert_within_single_tx() {
    let (_temp_file, conn) = setup();
    let item_repo = ItemRepository::new(conn.clone());

    {
        let mut guard = conn.lock().unwrap();
        let tx = guard.transaction().unwrap();
        // 首次为插入, 同 sku 再次为更新
        assert!(ItemRepository::upsert_by_sku_tx(&tx, "SKU-U001", "原名称", "EA").unwrap());
        assert!(!ItemRepository::upsert_by_sku_tx(&tx, "SKU-U001", "改名后", "KG").unwrap());
        tx.commit().unwrap();
    }

    let item = item_repo.find_by_sku("SKU-U001").unwrap().unwrap();
    assert_eq!(item.name, "改名后");
    assert_eq!(item.uom, "KG");
    assert_eq!(item_repo.list(10).unwrap().len(), 1);
}

#[test]
fn test_handling_unit_relocate_and_executor_heartbeat() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let hu_repo = HandlingUnitRepository::new(conn.clone());
    let executor_repo = ExecutorRepository::new(conn.clone());

    {
        let guard = conn.lock().unwrap();
        HandlingUnitRepository::relocate_tx(&guard, "HU_A", "LOC_B").unwrap();
        assert!(matches!(
            HandlingUnitRepository::relocate_tx(&guard, "HU_NOPE", "LOC_B"),
            Err(RepositoryError::NotFound { .. })
        ));
    }
    let hu = hu_repo.find_by_id("HU_A").unwrap().unwrap();
    assert_eq!(hu.location_id, "LOC_B");

    assert!(executor_repo
        .find_by_id("EXE_A")
        .unwrap()
        .unwrap()
        .last_seen_at
        .is_none());
    executor_repo.touch_last_seen("EXE_A").unwrap();
    assert!(executor_repo
        .find_by_id("EXE_A")
        .unwrap()
        .unwrap()
        .last_seen_at
        .is_some());
    match executor_repo.touch_last_seen("EXE_NOPE").unwrap_err() {
        RepositoryError::NotFound { entity, .. } => assert_eq!(entity, "Executor"),
        other => panic!("期望 NotFound, 实际 {:?}", other),
    }
}

#[test]
fn test_movement_ledger_scoped_to_mission() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let mission_repo = MissionRepository::new(conn.clone());
    let movement_repo = InventoryMovementRepository::new(conn.clone());

    for (mission_id, line_id) in [("MIS_D", "LINE_D1"), ("MIS_E", "LINE_E1")] {
        let mission = MissionBuilder::new(mission_id).build();
        let lines = vec![MissionLineBuilder::new(line_id, mission_id)
            .route("LOC_A", "LOC_B")
            .item("ITM_A")
            .qty(50.0)
            .build()];
        mission_repo.create_with_lines(&mission, &lines).unwrap();
    }

    let template = |line_id: &str, key: Option<&str>| InventoryMovement {
        id: InventoryMovementRepository::next_id(),
        mission_line_id: Some(line_id.to_string()),
        movement_type: MovementType::Move,
        item_id: Some("ITM_A".to_string()),
        from_location_id: Some("LOC_A".to_string()),
        to_location_id: Some("LOC_B".to_string()),
        from_hu_id: Some("HU_A".to_string()),
        to_hu_id: Some("HU_B".to_string()),
        qty: 10.0,
        executed_by_executor_id: Some("EXE_A".to_string()),
        executed_at: chrono::Utc::now().naive_utc(),
        idempotency_key: key.map(|k| k.to_string()),
        reason: None,
    };
    movement_repo.insert(&template("LINE_D1", None)).unwrap();
    movement_repo
        .insert(&template("LINE_D1", Some("scan-001")))
        .unwrap();
    movement_repo.insert(&template("LINE_E1", None)).unwrap();

    // JOIN 只返回本任务行项的台账
    assert_eq!(movement_repo.list_for_mission("MIS_D").unwrap().len(), 2);
    assert_eq!(movement_repo.list_for_mission("MIS_E").unwrap().len(), 1);
    assert_eq!(movement_repo.list(10).unwrap().len(), 3);

    // 幂等键可反查
    let replayed = movement_repo
        .find_by_idempotency_key("scan-001")
        .unwrap()
        .unwrap();
    assert_eq!(replayed.mission_line_id.as_deref(), Some("LINE_D1"));
    assert!(movement_repo
        .find_by_idempotency_key("scan-NOPE")
        .unwrap()
        .is_none());
}

#[test]
fn test_list_filters() {
    let (_temp_file, conn) = setup();
    seed_reference_data(&conn);
    let mission_repo = MissionRepository::new(conn.clone());
    let executor_repo = ExecutorRepository::new(conn.clone());
    let position_repo = InventoryPositionRepository::new(conn.clone());

    {
        let guard = conn.lock().unwrap();
        test_helpers::insert_executor(&guard, "EXE_B", "AGV-B", "AGV", 1200.0, true).unwrap();
        test_helpers::insert_item(&guard, "ITM_B", "SKU-B001").unwrap();
    }

    for (id, state) in [
        ("MIS_F", MissionState::Draft),
        ("MIS_G", MissionState::Draft),
        ("MIS_H", MissionState::Cancelled),
    ] {
        let mission = MissionBuilder::new(id).state(state).build();
        let lines = vec![MissionLineBuilder::new(&format!("LINE_{}", id), id)
            .route("LOC_A", "LOC_B")
            .item("ITM_A")
            .qty(10.0)
            .build()];
        mission_repo.create_with_lines(&mission, &lines).unwrap();
    }

    assert_eq!(
        mission_repo.list(Some(MissionState::Draft), 10).unwrap().len(),
        2
    );
    assert_eq!(
        mission_repo
            .list(Some(MissionState::Cancelled), 10)
            .unwrap()
            .len(),
        1
    );
    assert_eq!(mission_repo.list(None, 10).unwrap().len(), 3);
    assert_eq!(mission_repo.list(None, 2).unwrap().len(), 2);

    assert_eq!(
        executor_repo.list(Some(ExecutorType::Agv), 10).unwrap().len(),
        1
    );
    assert_eq!(executor_repo.list(None, 10).unwrap().len(), 2);

    position_repo.create("HU_A", "ITM_A", 10.0).unwrap();
    position_repo.create("HU_A", "ITM_B", 20.0).unwrap();
    position_repo.create("HU_B", "ITM_A", 30.0).unwrap();
    assert_eq!(
        position_repo.list(Some("HU_A"), None, 10).unwrap().len(),
        2
    );
    assert_eq!(
        position_repo.list(None, Some("ITM_A"), 10).unwrap().len(),
        2
    );
    assert_eq!(
        position_repo
            .list(Some("HU_B"), Some("ITM_A"), 10)
            .unwrap()
            .len(),
        1
    );
    assert_eq!(position_repo.list(None, None, 10).unwrap().len(), 3);
}
