// ==========================================
// 仓储执行系统 - 移动校验器
// ==========================================
// 职责: 台账变更前的全部业务规则闸口
// 红线: 无状态、无副作用、无 I/O 操作; 任何变更发生前必须先通过此校验
// 顺序: 规则按固定顺序评估, 首个失败即返回, 保证错误报告确定性
// ==========================================

use thiserror::Error;

use crate::domain::executor::{Executor, HUMAN_PAYLOAD_CEILING_KG};
use crate::domain::handling_unit::HandlingUnit;
use crate::domain::master_data::Location;
use crate::domain::mission::{Mission, MissionLine};
use crate::domain::types::{ExecutorType, HandlingUnitStatus, MissionState};

/// 移动规则校验失败
///
/// 错误文案是对外服务契约的一部分, 操作员直接可读, 不得随意改动
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MovementRuleViolation {
    #[error("Mission must be in progress to record movement")]
    MissionNotInProgress,

    #[error("Mission line does not belong to mission")]
    LineNotInMission,

    #[error("Movement qty must be positive")]
    QtyNotPositive,

    #[error("Movement qty exceeds remaining mission line qty")]
    QtyExceedsRemaining,

    #[error("Executor is inactive")]
    ExecutorInactive,

    #[error("Human executor cannot carry payload above 500kg")]
    HumanPayloadCeiling,

    #[error("Payload exceeds executor max payload")]
    PayloadExceedsMax,

    #[error("Source and destination locations must be active")]
    LocationInactive,

    #[error("Source and destination must be different")]
    SameSourceAndDestination,

    #[error("Handling unit is not at source location")]
    HandlingUnitNotAtSource,

    #[error("Blocked or sealed handling unit cannot be moved")]
    HandlingUnitNotMovable,
}

/// 一次移动校验所需的全部已加载状态
///
/// handling_unit 是行项引用的托盘 (整托搬运的搬运对象);
/// 拆零移动的 from/to 托盘覆盖在编排层另行校验
pub struct MovementCheckContext<'a> {
    pub mission: &'a Mission,
    pub line: &'a MissionLine,
    pub executor: &'a Executor,
    pub source: &'a Location,
    pub destination: &'a Location,
    pub qty: f64,
    pub handling_unit: Option<&'a HandlingUnit>,
}

/// 移动校验 (纯函数, 首个失败即返回)
///
/// # 规则顺序
/// 1. 任务必须处于 IN_PROGRESS
/// 2. 行项必须属于该任务
/// 3. qty > 0
/// 4. qty 不超过行项剩余量 (严格比较, 不引入容差)
/// 5. 执行者激活
/// 6. 人工执行者硬上限 500kg (与配置的 max_payload 无关)
/// 7. qty 不超过执行者 max_payload_kg
/// 8. 源/目的库位均激活
/// 9. 源/目的库位不同
/// 10. 行项托盘 (若有) 必须在源库位, 且非 BLOCKED/SEALED
pub fn validate_movement(ctx: &MovementCheckContext) -> Result<(), MovementRuleViolation> {
    // 规则 1: 任务状态
    if ctx.mission.state != MissionState::InProgress {
        return Err(MovementRuleViolation::MissionNotInProgress);
    }

    // 规则 2: 行项归属 (防御跨任务行引用)
    if ctx.line.mission_id != ctx.mission.id {
        return Err(MovementRuleViolation::LineNotInMission);
    }

    // 规则 3: 数量为正
    if ctx.qty <= 0.0 {
        return Err(MovementRuleViolation::QtyNotPositive);
    }

    // 规则 4: 剩余量上限
    if ctx.qty > ctx.line.remaining_qty() {
        return Err(MovementRuleViolation::QtyExceedsRemaining);
    }

    // 规则 5: 执行者激活
    if !ctx.executor.active {
        return Err(MovementRuleViolation::ExecutorInactive);
    }

    // 规则 6: 人工硬上限, 优先于配置的 max_payload
    if ctx.executor.executor_type == ExecutorType::Human && ctx.qty > HUMAN_PAYLOAD_CEILING_KG {
        return Err(MovementRuleViolation::HumanPayloadCeiling);
    }

    // 规则 7: 配置载荷上限
    if ctx.qty > ctx.executor.max_payload_kg {
        return Err(MovementRuleViolation::PayloadExceedsMax);
    }

    // 规则 8: 库位激活
    if !ctx.source.active || !ctx.destination.active {
        return Err(MovementRuleViolation::LocationInactive);
    }

    // 规则 9: 源目的不同
    if ctx.source.id == ctx.destination.id {
        return Err(MovementRuleViolation::SameSourceAndDestination);
    }

    // 规则 10: 行项托盘位置与状态
    if let Some(hu) = ctx.handling_unit {
        if hu.location_id != ctx.source.id {
            return Err(MovementRuleViolation::HandlingUnitNotAtSource);
        }
        if matches!(
            hu.status,
            HandlingUnitStatus::Blocked | HandlingUnitStatus::Sealed
        ) {
            return Err(MovementRuleViolation::HandlingUnitNotMovable);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mission::MissionLinePayload;
    use crate::domain::types::{LocationType, MissionType};
    use chrono::Utc;

    fn make_mission(state: MissionState) -> Mission {
        Mission {
            id: "MIS_T1".to_string(),
            mission_no: "M-001".to_string(),
            mission_type: MissionType::MoveItem,
            state,
            priority: 0,
            created_by_operator_id: "OPR_T1".to_string(),
            assigned_executor_id: Some("EXE_T1".to_string()),
            created_at: Utc::now().naive_utc(),
            started_at: None,
            completed_at: None,
            cancel_reason: None,
        }
    }

    fn make_line(qty: f64, qty_done: f64) -> MissionLine {
        MissionLine {
            id: "LINE_T1".to_string(),
            mission_id: "MIS_T1".to_string(),
            from_location_id: "LOC_A".to_string(),
            to_location_id: "LOC_B".to_string(),
            payload: MissionLinePayload::MoveItem {
                item_id: "ITM_T1".to_string(),
                hu_id: None,
            },
            qty,
            qty_done,
        }
    }

    fn make_executor(executor_type: ExecutorType, max_payload_kg: f64, active: bool) -> Executor {
        Executor {
            id: "EXE_T1".to_string(),
            code: "EX-01".to_string(),
            name: "执行者".to_string(),
            executor_type,
            max_payload_kg,
            active,
            last_seen_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn make_location(id: &str, active: bool) -> Location {
        Location {
            id: id.to_string(),
            code: format!("CODE-{}", id),
            name: format!("库位{}", id),
            location_type: LocationType::Bulk,
            active,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn make_hu(location_id: &str, status: HandlingUnitStatus) -> HandlingUnit {
        HandlingUnit {
            id: "HU_T1".to_string(),
            hu_code: "HU-001".to_string(),
            location_id: location_id.to_string(),
            status,
            created_at: Utc::now().naive_utc(),
        }
    }

    struct Fixture {
        mission: Mission,
        line: MissionLine,
        executor: Executor,
        source: Location,
        destination: Location,
    }

    fn fixture() -> Fixture {
        Fixture {
            mission: make_mission(MissionState::InProgress),
            line: make_line(100.0, 0.0),
            executor: make_executor(ExecutorType::Agv, 1000.0, true),
            source: make_location("LOC_A", true),
            destination: make_location("LOC_B", true),
        }
    }

    fn check(f: &Fixture, qty: f64, hu: Option<&HandlingUnit>) -> Result<(), MovementRuleViolation> {
        validate_movement(&MovementCheckContext {
            mission: &f.mission,
            line: &f.line,
            executor: &f.executor,
            source: &f.source,
            destination: &f.destination,
            qty,
            handling_unit: hu,
        })
    }

    // ==========================================
    // 测试 1: 通过路径
    // ==========================================

    #[test]
    fn test_validate_movement_ok() {
        let f = fixture();
        assert!(check(&f, 30.0, None).is_ok());
    }

    #[test]
    fn test_validate_movement_ok_with_open_hu_at_source() {
        let f = fixture();
        let hu = make_hu("LOC_A", HandlingUnitStatus::Open);
        assert!(check(&f, 30.0, Some(&hu)).is_ok());
    }

    // ==========================================
    // 测试 2: 各规则单独触发
    // ==========================================

    #[test]
    fn test_mission_must_be_in_progress() {
        let mut f = fixture();
        f.mission = make_mission(MissionState::Assigned);
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::MissionNotInProgress
        );
    }

    #[test]
    fn test_line_must_belong_to_mission() {
        let mut f = fixture();
        f.line.mission_id = "MIS_OTHER".to_string();
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::LineNotInMission
        );
    }

    #[test]
    fn test_qty_must_be_positive() {
        let f = fixture();
        assert_eq!(
            check(&f, 0.0, None).unwrap_err(),
            MovementRuleViolation::QtyNotPositive
        );
        assert_eq!(
            check(&f, -5.0, None).unwrap_err(),
            MovementRuleViolation::QtyNotPositive
        );
    }

    #[test]
    fn test_qty_exceeds_remaining() {
        let mut f = fixture();
        f.line = make_line(10.0, 8.0);
        let err = check(&f, 5.0, None).unwrap_err();
        assert_eq!(err, MovementRuleViolation::QtyExceedsRemaining);
        assert_eq!(
            err.to_string(),
            "Movement qty exceeds remaining mission line qty"
        );
    }

    #[test]
    fn test_qty_exactly_remaining_is_allowed() {
        let mut f = fixture();
        f.line = make_line(10.0, 8.0);
        assert!(check(&f, 2.0, None).is_ok());
    }

    #[test]
    fn test_inactive_executor() {
        let mut f = fixture();
        f.executor = make_executor(ExecutorType::Agv, 1000.0, false);
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::ExecutorInactive
        );
    }

    #[test]
    fn test_human_hard_ceiling_overrides_configured_max() {
        // 人工执行者配置了更大的 max_payload 也不能超过 500kg 硬上限
        let mut f = fixture();
        f.executor = make_executor(ExecutorType::Human, 1000.0, true);
        f.line = make_line(2000.0, 0.0);
        let err = check(&f, 600.0, None).unwrap_err();
        assert_eq!(err, MovementRuleViolation::HumanPayloadCeiling);
        assert_eq!(
            err.to_string(),
            "Human executor cannot carry payload above 500kg"
        );
    }

    #[test]
    fn test_human_at_exact_ceiling_is_allowed() {
        let mut f = fixture();
        f.executor = make_executor(ExecutorType::Human, 1000.0, true);
        f.line = make_line(2000.0, 0.0);
        assert!(check(&f, 500.0, None).is_ok());
    }

    #[test]
    fn test_payload_exceeds_executor_max() {
        let mut f = fixture();
        f.executor = make_executor(ExecutorType::Agv, 50.0, true);
        assert_eq!(
            check(&f, 80.0, None).unwrap_err(),
            MovementRuleViolation::PayloadExceedsMax
        );
    }

    #[test]
    fn test_inactive_locations() {
        let mut f = fixture();
        f.source = make_location("LOC_A", false);
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::LocationInactive
        );

        let mut f = fixture();
        f.destination = make_location("LOC_B", false);
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::LocationInactive
        );
    }

    #[test]
    fn test_same_source_and_destination() {
        let mut f = fixture();
        f.destination = make_location("LOC_A", true);
        assert_eq!(
            check(&f, 30.0, None).unwrap_err(),
            MovementRuleViolation::SameSourceAndDestination
        );
    }

    #[test]
    fn test_hu_not_at_source() {
        let f = fixture();
        let hu = make_hu("LOC_OTHER", HandlingUnitStatus::Open);
        assert_eq!(
            check(&f, 30.0, Some(&hu)).unwrap_err(),
            MovementRuleViolation::HandlingUnitNotAtSource
        );
    }

    #[test]
    fn test_blocked_or_sealed_hu_rejected() {
        let f = fixture();
        for status in [HandlingUnitStatus::Blocked, HandlingUnitStatus::Sealed] {
            let hu = make_hu("LOC_A", status);
            assert_eq!(
                check(&f, 30.0, Some(&hu)).unwrap_err(),
                MovementRuleViolation::HandlingUnitNotMovable
            );
        }
    }

    // ==========================================
    // 测试 3: 首个失败优先 (顺序确定性)
    // ==========================================

    #[test]
    fn test_first_failure_wins() {
        // 同时违反: 任务未开工 + 数量为负 + 库位相同
        let mut f = fixture();
        f.mission = make_mission(MissionState::Draft);
        f.destination = make_location("LOC_A", true);
        assert_eq!(
            check(&f, -1.0, None).unwrap_err(),
            MovementRuleViolation::MissionNotInProgress
        );
    }
}
