// ==========================================
// 仓储执行系统 - 库存 API
// ==========================================
// 职责: 持仓/台账查询, 手工库存调整
// 红线: 任何数量变更必须走版本校验的 CAS 更新, 且伴随一条台账;
//       调整失败不自动重试, 冲突原样上抛由调用方决定重试
// ==========================================

use rusqlite::{Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::inventory::{InventoryMovement, InventoryPosition};
use crate::domain::types::MovementType;
use crate::repository::handling_unit_repo::HandlingUnitRepository;
use crate::repository::inventory_repo::{InventoryMovementRepository, InventoryPositionRepository};

use chrono::Utc;

// ==========================================
// 命令对象
// ==========================================

/// 手工库存调整命令
///
/// qty_delta 正数为增加, 负数为减少, 禁止为零
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustInventoryCommand {
    pub hu_id: String,
    pub item_id: String,
    pub qty_delta: f64,
    /// 调整原因, 审计必填
    pub reason: String,
    #[serde(default)]
    pub executor_id: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

// ==========================================
// InventoryApi - 库存 API
// ==========================================

/// 库存API
///
/// 职责:
/// 1. 持仓与台账查询
/// 2. 手工调整 (盘盈/盘亏/报损), 单事务 CAS + 台账
pub struct InventoryApi {
    conn: Arc<Mutex<Connection>>,
    position_repo: Arc<InventoryPositionRepository>,
    movement_repo: Arc<InventoryMovementRepository>,
    config: Arc<ConfigManager>,
}

impl InventoryApi {
    /// 创建新的InventoryApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        position_repo: Arc<InventoryPositionRepository>,
        movement_repo: Arc<InventoryMovementRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            position_repo,
            movement_repo,
            config,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 持仓列表 (可按托盘/物料过滤, 追加顺序)
    pub fn list_positions(
        &self,
        hu_id: Option<&str>,
        item_id: Option<&str>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<InventoryPosition>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.position_repo.list(hu_id, item_id, limit)?)
    }

    /// 台账列表 (追加顺序)
    pub fn list_movements(&self, limit: Option<i64>) -> ApiResult<Vec<InventoryMovement>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.movement_repo.list(limit)?)
    }

    fn resolve_limit(&self, limit: Option<i64>) -> ApiResult<i64> {
        match limit {
            Some(n) if n > 0 => Ok(n),
            Some(_) => Err(ApiError::InvalidInput("limit 必须大于0".to_string())),
            None => self
                .config
                .get_default_listing_limit()
                .map_err(|e| ApiError::DatabaseError(e.to_string())),
        }
    }

    // ==========================================
    // 手工调整
    // ==========================================

    /// 手工库存调整 (盘盈/盘亏/报损)
    ///
    /// 单事务内按固定顺序执行:
    /// 1. 加载托盘 (缺失即 404)
    /// 2. 幂等键重放检测 (命中直接返回首次记录, 零变更)
    /// 3. 持仓定位: 缺失 + 负增量拒绝; 缺失 + 正增量懒建 0 量持仓
    /// 4. CAS 应用增量, 失败以 ConflictError 上抛
    /// 5. 写 ADJUSTMENT 台账 (负增量填 from 侧, 正增量填 to 侧, qty 取绝对值)
    pub fn adjust_inventory(&self, cmd: AdjustInventoryCommand) -> ApiResult<InventoryMovement> {
        // 参数验证
        if cmd.reason.trim().is_empty() {
            return Err(ApiError::InvalidInput("调整原因不能为空".to_string()));
        }
        if cmd.reason.len() > 500 {
            return Err(ApiError::InvalidInput(
                "调整原因不能超过500个字符".to_string(),
            ));
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

        let movement = Self::adjust_in_tx(&tx, &cmd)?;

        tx.commit()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        info!(
            hu_id = %cmd.hu_id,
            item_id = %cmd.item_id,
            qty_delta = cmd.qty_delta,
            movement_id = %movement.id,
            "库存调整成功"
        );

        Ok(movement)
    }

    /// adjust_inventory 的事务内主体
    fn adjust_in_tx(tx: &Transaction, cmd: &AdjustInventoryCommand) -> ApiResult<InventoryMovement> {
        // 1. 零增量拒绝
        if cmd.qty_delta == 0.0 {
            return Err(ApiError::BusinessRuleViolation(
                "qty_delta must not be zero".to_string(),
            ));
        }

        // 2. 托盘必须存在
        let handling_unit = HandlingUnitRepository::find_by_id_tx(tx, &cmd.hu_id)?
            .ok_or_else(|| ApiError::NotFound(format!("HandlingUnit(id={})不存在", cmd.hu_id)))?;

        // 3. 幂等重放
        if let Some(key) = &cmd.idempotency_key {
            if let Some(existing) = InventoryMovementRepository::find_by_idempotency_key_tx(tx, key)?
            {
                debug!(idempotency_key = %key, movement_id = %existing.id, "幂等键命中, 返回首次记录");
                return Ok(existing);
            }
        }

        // 4. 持仓定位
        let position =
            match InventoryPositionRepository::find_by_pair_tx(tx, &cmd.hu_id, &cmd.item_id)? {
                Some(position) => position,
                None => {
                    if cmd.qty_delta < 0.0 {
                        return Err(ApiError::BusinessRuleViolation(
                            "Cannot reduce stock for a missing inventory position".to_string(),
                        ));
                    }
                    InventoryPositionRepository::create_tx(tx, &cmd.hu_id, &cmd.item_id, 0.0)?
                }
            };

        // 5. CAS 应用增量
        let applied = InventoryPositionRepository::apply_delta_if_version_tx(
            tx,
            &position.id,
            position.version,
            cmd.qty_delta,
        )?;
        if !applied {
            return Err(ApiError::ConflictError(
                "Inventory update conflict or insufficient stock".to_string(),
            ));
        }

        // 6. ADJUSTMENT 台账: 方向由增量符号决定
        let (from_location_id, from_hu_id, to_location_id, to_hu_id) = if cmd.qty_delta < 0.0 {
            (
                Some(handling_unit.location_id.clone()),
                Some(cmd.hu_id.clone()),
                None,
                None,
            )
        } else {
            (
                None,
                None,
                Some(handling_unit.location_id.clone()),
                Some(cmd.hu_id.clone()),
            )
        };

        let movement = InventoryMovement {
            id: InventoryMovementRepository::next_id(),
            mission_line_id: None,
            movement_type: MovementType::Adjustment,
            item_id: Some(cmd.item_id.clone()),
            from_location_id,
            to_location_id,
            from_hu_id,
            to_hu_id,
            qty: cmd.qty_delta.abs(),
            executed_by_executor_id: cmd.executor_id.clone(),
            executed_at: Utc::now().naive_utc(),
            idempotency_key: cmd.idempotency_key.clone(),
            reason: Some(cmd.reason.clone()),
        };
        InventoryMovementRepository::insert_tx(tx, &movement)?;

        Ok(movement)
    }
}
