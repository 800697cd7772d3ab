// ==========================================
// 仓储执行系统 - 任务 API
// ==========================================
// 职责: 任务生命周期编排 (创建/指派/启动/记录移动/完成/取消)
// 约束: 复合命令 (record_movement) 在单一事务内完成全部读写,
//       失败时整体回滚, 外部不可观察到部分状态
// 约束: 校验必须先于任何变更 (引擎纯校验 -> 台账 CAS -> 行项累计)
// ==========================================

use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::inventory::InventoryMovement;
use crate::domain::mission::{Mission, MissionLine, MissionLinePayload, MissionWithLines};
use crate::domain::types::{MissionState, MissionType, MovementType};
use crate::engine::movement_check::{validate_movement, MovementCheckContext};
use crate::engine::transition::{
    validate_assign, validate_cancel, validate_complete, validate_start,
};
use crate::repository::executor_repo::ExecutorRepository;
use crate::repository::handling_unit_repo::HandlingUnitRepository;
use crate::repository::inventory_repo::{InventoryMovementRepository, InventoryPositionRepository};
use crate::repository::master_data_repo::LocationRepository;
use crate::repository::mission_repo::MissionRepository;

use chrono::Utc;
use uuid::Uuid;

// ==========================================
// 命令对象
// ==========================================

/// 创建任务时的行项草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionLineDraft {
    pub from_location_id: String,
    pub to_location_id: String,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub hu_id: Option<String>,
    pub qty: f64,
}

/// 创建任务命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionCreateCommand {
    pub mission_no: String,
    pub mission_type: MissionType,
    /// 省略时取配置 mission/default_priority
    #[serde(default)]
    pub priority: Option<i32>,
    pub created_by_operator_id: String,
    pub lines: Vec<MissionLineDraft>,
}

/// 记录移动命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMovementCommand {
    pub mission_line_id: String,
    pub qty: f64,
    pub executor_id: String,
    /// 拆零移动的来源托盘覆盖 (缺省用行项托盘)
    #[serde(default)]
    pub from_hu_id: Option<String>,
    /// 拆零移动的目的托盘覆盖 (缺省用行项托盘)
    #[serde(default)]
    pub to_hu_id: Option<String>,
    /// 幂等键; 重放时原样返回首次的台账记录
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

// ==========================================
// MissionApi - 任务 API
// ==========================================

/// 任务API
///
/// 职责:
/// 1. 任务创建与查询
/// 2. 生命周期转换 (指派/启动/完成/取消), 前置校验走 engine
/// 3. 移动记录: 校验 -> 台账 CAS -> 行项累计, 单事务
pub struct MissionApi {
    conn: Arc<Mutex<Connection>>,
    mission_repo: Arc<MissionRepository>,
    executor_repo: Arc<ExecutorRepository>,
    location_repo: Arc<LocationRepository>,
    handling_unit_repo: Arc<HandlingUnitRepository>,
    movement_repo: Arc<InventoryMovementRepository>,
    config: Arc<ConfigManager>,
}

impl MissionApi {
    /// 创建新的MissionApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        mission_repo: Arc<MissionRepository>,
        executor_repo: Arc<ExecutorRepository>,
        location_repo: Arc<LocationRepository>,
        handling_unit_repo: Arc<HandlingUnitRepository>,
        movement_repo: Arc<InventoryMovementRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            mission_repo,
            executor_repo,
            location_repo,
            handling_unit_repo,
            movement_repo,
            config,
        }
    }

    // ==========================================
    // 创建与查询
    // ==========================================

    /// 创建任务 (DRAFT 状态) 及其全部行项
    ///
    /// # 参数
    /// - cmd: 创建命令, 行项至少一条
    ///
    /// # 返回
    /// - Ok(MissionWithLines): 新建任务
    /// - Err(ApiError::DuplicateKey): 任务编号已存在
    pub fn create_mission(&self, cmd: MissionCreateCommand) -> ApiResult<MissionWithLines> {
        // 参数验证
        let mission_no = cmd.mission_no.trim();
        if mission_no.is_empty() || mission_no.len() > 64 {
            return Err(ApiError::InvalidInput(
                "任务编号必须为1~64个字符".to_string(),
            ));
        }
        if let Some(priority) = cmd.priority {
            if priority < 0 {
                return Err(ApiError::InvalidInput("优先级不能为负".to_string()));
            }
        }
        if cmd.lines.is_empty() {
            return Err(ApiError::InvalidInput("任务至少需要一个行项".to_string()));
        }

        let priority = match cmd.priority {
            Some(p) => p,
            None => self
                .config
                .get_default_priority()
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?,
        };

        let mission = Mission {
            id: format!("MIS_{}", Uuid::new_v4()),
            mission_no: mission_no.to_string(),
            mission_type: cmd.mission_type,
            state: MissionState::Draft,
            priority,
            created_by_operator_id: cmd.created_by_operator_id.clone(),
            assigned_executor_id: None,
            created_at: Utc::now().naive_utc(),
            started_at: None,
            completed_at: None,
            cancel_reason: None,
        };

        let mut lines = Vec::with_capacity(cmd.lines.len());
        for draft in &cmd.lines {
            if draft.qty <= 0.0 {
                return Err(ApiError::InvalidInput("行项数量必须大于0".to_string()));
            }
            let payload =
                MissionLinePayload::from_columns(draft.item_id.clone(), draft.hu_id.clone())
                    .ok_or_else(|| {
                        ApiError::InvalidInput(
                            "行项必须指定 item_id 或 hu_id 之一".to_string(),
                        )
                    })?;
            lines.push(MissionLine {
                id: format!("LINE_{}", Uuid::new_v4()),
                mission_id: mission.id.clone(),
                from_location_id: draft.from_location_id.clone(),
                to_location_id: draft.to_location_id.clone(),
                payload,
                qty: draft.qty,
                qty_done: 0.0,
            });
        }

        self.mission_repo.create_with_lines(&mission, &lines)?;

        info!(
            mission_id = %mission.id,
            mission_no = %mission.mission_no,
            lines = lines.len(),
            "任务创建成功"
        );

        Ok(MissionWithLines { mission, lines })
    }

    /// 任务列表 (可按状态过滤, 含行项)
    ///
    /// limit 省略时取配置 listing/default_limit
    pub fn list_missions(
        &self,
        state: Option<MissionState>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<MissionWithLines>> {
        let limit = match limit {
            Some(n) if n > 0 => n,
            Some(_) => {
                return Err(ApiError::InvalidInput("limit 必须大于0".to_string()));
            }
            None => self
                .config
                .get_default_listing_limit()
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?,
        };

        let missions = self.mission_repo.list(state, limit)?;
        let mut result = Vec::with_capacity(missions.len());
        for mission in missions {
            let lines = self.mission_repo.lines_for_mission(&mission.id)?;
            result.push(MissionWithLines { mission, lines });
        }
        Ok(result)
    }

    /// 查询任务详情 (含行项)
    pub fn get_mission(&self, mission_id: &str) -> ApiResult<MissionWithLines> {
        self.mission_repo
            .find_with_lines(mission_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Mission(id={})不存在", mission_id)))
    }

    /// 更新任务优先级
    pub fn update_priority(&self, mission_id: &str, priority: i32) -> ApiResult<MissionWithLines> {
        if priority < 0 {
            return Err(ApiError::InvalidInput("优先级不能为负".to_string()));
        }
        // 先确认存在, 保持 404 语义
        self.get_mission(mission_id)?;
        self.mission_repo.update_priority(mission_id, priority)?;
        self.get_mission(mission_id)
    }

    /// 查询任务关联的全部台账记录 (经行项, 追加顺序)
    pub fn list_movements_for_mission(
        &self,
        mission_id: &str,
    ) -> ApiResult<Vec<InventoryMovement>> {
        self.get_mission(mission_id)?;
        Ok(self.movement_repo.list_for_mission(mission_id)?)
    }

    // ==========================================
    // 生命周期转换
    // ==========================================

    /// 指派执行者: DRAFT -> ASSIGNED
    pub fn assign(&self, mission_id: &str, executor_id: &str) -> ApiResult<MissionWithLines> {
        let mission = self.get_mission(mission_id)?;
        let executor = self
            .executor_repo
            .find_by_id(executor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Executor(id={})不存在", executor_id)))?;

        validate_assign(&mission, &executor)?;
        self.mission_repo.mark_assigned(mission_id, executor_id)?;
        // 指派视为一次执行者交互, 顺带刷新心跳
        self.executor_repo.touch_last_seen(executor_id)?;

        info!(mission_id = %mission_id, executor_id = %executor_id, "任务已指派");
        self.get_mission(mission_id)
    }

    /// 启动执行: ASSIGNED -> IN_PROGRESS (仅被指派执行者本人)
    pub fn start(&self, mission_id: &str, executor_id: &str) -> ApiResult<MissionWithLines> {
        let mission = self.get_mission(mission_id)?;
        let executor = self
            .executor_repo
            .find_by_id(executor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Executor(id={})不存在", executor_id)))?;

        validate_start(&mission, &executor)?;
        self.mission_repo.mark_started(mission_id)?;
        self.executor_repo.touch_last_seen(executor_id)?;

        info!(mission_id = %mission_id, executor_id = %executor_id, "任务已启动");
        self.get_mission(mission_id)
    }

    /// 完成任务: IN_PROGRESS -> COMPLETED (要求全部行项足量完成)
    pub fn complete(&self, mission_id: &str) -> ApiResult<MissionWithLines> {
        let mission = self.get_mission(mission_id)?;
        validate_complete(&mission)?;
        self.mission_repo.mark_completed(mission_id)?;

        info!(mission_id = %mission_id, "任务已完成");
        self.get_mission(mission_id)
    }

    /// 取消任务: 任意非终态 -> CANCELLED, 必须给出非空原因
    pub fn cancel(&self, mission_id: &str, reason: &str) -> ApiResult<MissionWithLines> {
        if reason.len() > 500 {
            return Err(ApiError::InvalidInput(
                "取消原因不能超过500个字符".to_string(),
            ));
        }
        let mission = self.get_mission(mission_id)?;
        validate_cancel(&mission.mission, reason)?;
        self.mission_repo.mark_cancelled(mission_id, reason)?;

        info!(mission_id = %mission_id, reason = %reason, "任务已取消");
        self.get_mission(mission_id)
    }

    // ==========================================
    // 记录移动 (核心复合命令)
    // ==========================================

    /// 记录一次物理移动
    ///
    /// 单事务内按固定顺序执行:
    /// 1. 加载任务/行项/执行者/库位 (缺失即 404)
    /// 2. 幂等键重放检测 (命中直接返回首次记录, 零变更)
    /// 3. 加载行项托盘 (若有)
    /// 4. 引擎纯校验 (无副作用)
    /// 5. 整托搬运: 托盘落位 + 一条 MOVE 台账
    ///    拆零移动: 来源 CAS 扣减 -> 目的懒建 -> 目的 CAS 增加 -> 一条 MOVE 台账
    /// 6. 行项 qty_done 累计
    ///
    /// 任一步失败整体回滚; CAS 失败以 ConflictError 上抛, 从不自动重试
    pub fn record_movement(
        &self,
        mission_id: &str,
        cmd: RecordMovementCommand,
    ) -> ApiResult<InventoryMovement> {
        // 参数验证
        if cmd.qty <= 0.0 {
            return Err(ApiError::InvalidInput("移动数量必须大于0".to_string()));
        }
        if let Some(key) = &cmd.idempotency_key {
            if key.is_empty() || key.len() > 128 {
                return Err(ApiError::InvalidInput(
                    "幂等键必须为1~128个字符".to_string(),
                ));
            }
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))?;
        let tx = conn
            .transaction()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        let movement = Self::record_movement_in_tx(&tx, mission_id, &cmd)?;

        tx.commit()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        info!(
            mission_id = %mission_id,
            mission_line_id = %cmd.mission_line_id,
            movement_id = %movement.id,
            qty = cmd.qty,
            "移动记录成功"
        );

        Ok(movement)
    }

    /// record_movement 的事务内主体
    fn record_movement_in_tx(
        tx: &Transaction,
        mission_id: &str,
        cmd: &RecordMovementCommand,
    ) -> ApiResult<InventoryMovement> {
        // 1. 加载引用状态
        let mission = MissionRepository::find_with_lines_tx(tx, mission_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Mission(id={})不存在", mission_id)))?;

        let line = MissionRepository::find_line_by_id_tx(tx, &cmd.mission_line_id)?.ok_or_else(
            || ApiError::NotFound(format!("MissionLine(id={})不存在", cmd.mission_line_id)),
        )?;

        let executor = ExecutorRepository::find_by_id_tx(tx, &cmd.executor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Executor(id={})不存在", cmd.executor_id)))?;

        let source = LocationRepository::find_by_id_tx(tx, &line.from_location_id)?;
        let destination = LocationRepository::find_by_id_tx(tx, &line.to_location_id)?;
        let (source, destination) = match (source, destination) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                return Err(ApiError::InvalidInput(
                    "Mission line locations are invalid".to_string(),
                ))
            }
        };

        // 2. 幂等重放: 必须发生在任何变更之前
        if let Some(key) = &cmd.idempotency_key {
            if let Some(existing) = InventoryMovementRepository::find_by_idempotency_key_tx(tx, key)?
            {
                debug!(idempotency_key = %key, movement_id = %existing.id, "幂等键命中, 返回首次记录");
                return Ok(existing);
            }
        }

        // 3. 行项托盘
        let line_hu = match line.payload.hu_id() {
            Some(hu_id) => Some(
                HandlingUnitRepository::find_by_id_tx(tx, hu_id)?.ok_or_else(|| {
                    ApiError::NotFound(format!("HandlingUnit(id={})不存在", hu_id))
                })?,
            ),
            None => None,
        };

        // 4. 引擎纯校验
        validate_movement(&MovementCheckContext {
            mission: &mission.mission,
            line: &line,
            executor: &executor,
            source: &source,
            destination: &destination,
            qty: cmd.qty,
            handling_unit: line_hu.as_ref(),
        })?;

        let now = Utc::now().naive_utc();

        // 5. 按行项载荷分支
        let movement = match &line.payload {
            MissionLinePayload::MoveHandlingUnit { hu_id } => {
                // 整托搬运: 托盘落位到目的库位, 台账 from_hu = to_hu
                HandlingUnitRepository::relocate_tx(tx, hu_id, &destination.id)?;

                let movement = InventoryMovement {
                    id: InventoryMovementRepository::next_id(),
                    mission_line_id: Some(line.id.clone()),
                    movement_type: MovementType::Move,
                    item_id: None,
                    from_location_id: Some(source.id.clone()),
                    to_location_id: Some(destination.id.clone()),
                    from_hu_id: Some(hu_id.clone()),
                    to_hu_id: Some(hu_id.clone()),
                    qty: cmd.qty,
                    executed_by_executor_id: Some(executor.id.clone()),
                    executed_at: now,
                    idempotency_key: cmd.idempotency_key.clone(),
                    reason: None,
                };
                InventoryMovementRepository::insert_tx(tx, &movement)?;
                movement
            }
            MissionLinePayload::MoveItem { item_id, hu_id } => {
                // 拆零移动: 命令可覆盖来源/目的托盘, 缺省用行项托盘
                let from_hu_id = cmd.from_hu_id.clone().or_else(|| hu_id.clone());
                let to_hu_id = cmd.to_hu_id.clone().or_else(|| hu_id.clone());
                let (from_hu_id, to_hu_id) = match (from_hu_id, to_hu_id) {
                    (Some(f), Some(t)) => (f, t),
                    _ => {
                        return Err(ApiError::BusinessRuleViolation(
                            "Item movement requires from_hu_id and to_hu_id".to_string(),
                        ))
                    }
                };

                let from_hu = HandlingUnitRepository::find_by_id_tx(tx, &from_hu_id)?;
                let to_hu = HandlingUnitRepository::find_by_id_tx(tx, &to_hu_id)?;
                let (from_hu, to_hu) = match (from_hu, to_hu) {
                    (Some(f), Some(t)) => (f, t),
                    _ => {
                        return Err(ApiError::BusinessRuleViolation(
                            "from_hu_id and to_hu_id must reference existing handling units"
                                .to_string(),
                        ))
                    }
                };
                if from_hu.location_id != source.id {
                    return Err(ApiError::BusinessRuleViolation(
                        "from_hu_id is not located at source location".to_string(),
                    ));
                }
                if to_hu.location_id != destination.id {
                    return Err(ApiError::BusinessRuleViolation(
                        "to_hu_id is not located at destination location".to_string(),
                    ));
                }

                // 来源持仓必须已存在
                let source_position =
                    InventoryPositionRepository::find_by_pair_tx(tx, &from_hu_id, item_id)?
                        .ok_or_else(|| {
                            ApiError::BusinessRuleViolation(
                                "Source inventory position not found".to_string(),
                            )
                        })?;

                // 来源 CAS 扣减 (版本校验 + 余量保护)
                let deducted = InventoryPositionRepository::apply_delta_if_version_tx(
                    tx,
                    &source_position.id,
                    source_position.version,
                    -cmd.qty,
                )?;
                if !deducted {
                    return Err(ApiError::ConflictError(
                        "Insufficient stock or concurrent source update".to_string(),
                    ));
                }

                // 目的持仓懒建 (0量, version=1), 再 CAS 增加
                let destination_position =
                    match InventoryPositionRepository::find_by_pair_tx(tx, &to_hu_id, item_id)? {
                        Some(position) => position,
                        None => InventoryPositionRepository::create_tx(tx, &to_hu_id, item_id, 0.0)?,
                    };

                let added = InventoryPositionRepository::apply_delta_if_version_tx(
                    tx,
                    &destination_position.id,
                    destination_position.version,
                    cmd.qty,
                )?;
                if !added {
                    return Err(ApiError::ConflictError(
                        "Concurrent destination update conflict".to_string(),
                    ));
                }

                let movement = InventoryMovement {
                    id: InventoryMovementRepository::next_id(),
                    mission_line_id: Some(line.id.clone()),
                    movement_type: MovementType::Move,
                    item_id: Some(item_id.clone()),
                    from_location_id: Some(source.id.clone()),
                    to_location_id: Some(destination.id.clone()),
                    from_hu_id: Some(from_hu_id),
                    to_hu_id: Some(to_hu_id),
                    qty: cmd.qty,
                    executed_by_executor_id: Some(executor.id.clone()),
                    executed_at: now,
                    idempotency_key: cmd.idempotency_key.clone(),
                    reason: None,
                };
                InventoryMovementRepository::insert_tx(tx, &movement)?;
                movement
            }
        };

        // 6. 行项完成量累计
        MissionRepository::increment_line_qty_done_tx(tx, &line.id, cmd.qty)?;

        Ok(movement)
    }

    // ==========================================
    // request 别名视图 (旧上游系统对接)
    // ==========================================

    /// request 视图创建, 语义等同 create_mission
    pub fn create_request(&self, cmd: MissionCreateCommand) -> ApiResult<MissionWithLines> {
        self.create_mission(cmd)
    }

    /// request 视图查询, 404 按 Request 命名
    pub fn get_request(&self, mission_id: &str) -> ApiResult<MissionWithLines> {
        self.mission_repo
            .find_with_lines(mission_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Request(id={})不存在", mission_id)))
    }

    /// request 视图列表 (全状态)
    pub fn list_requests(&self, limit: Option<i64>) -> ApiResult<Vec<MissionWithLines>> {
        self.list_missions(None, limit)
    }
}
