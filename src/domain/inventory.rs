// ==========================================
// 仓储执行系统 - 库存领域模型
// ==========================================
// 红线: 库存数量只能经版本校验的增量更新修改,
//       且每次数量变化必须伴随一条不可变台账记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::MovementType;

// ==========================================
// InventoryPosition - 库存持仓
// ==========================================
// 以 (托盘, 物料) 复合键唯一; version 为乐观并发令牌,
// 从 1 起每次成功的数量变更 +1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryPosition {
    pub id: String,                // 持仓ID
    pub hu_id: String,             // 托盘
    pub item_id: String,           // 物料
    pub qty_on_hand: f64,          // 在库数量 (>=0)
    pub qty_reserved: f64,         // 预留数量 (0 <= reserved <= on_hand)
    pub version: i64,              // 乐观锁版本号 (>=1)
    pub updated_at: NaiveDateTime, // 更新时间
}

impl InventoryPosition {
    /// 可用数量 (在库 - 预留)
    pub fn qty_available(&self) -> f64 {
        self.qty_on_hand - self.qty_reserved
    }
}

// ==========================================
// InventoryMovement - 库存移动台账
// ==========================================
// 只追加不修改; 是持仓数量变化的唯一审计凭证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: String,                              // 台账ID
    pub mission_line_id: Option<String>,         // 关联任务行项 (调整类为空)
    pub movement_type: MovementType,             // MOVE / ADJUSTMENT
    pub item_id: Option<String>,                 // 物料 (整托搬运为空)
    pub from_location_id: Option<String>,        // 来源库位
    pub to_location_id: Option<String>,          // 目标库位
    pub from_hu_id: Option<String>,              // 来源托盘
    pub to_hu_id: Option<String>,                // 目标托盘
    pub qty: f64,                                // 数量 (>0)
    pub executed_by_executor_id: Option<String>, // 执行者
    pub executed_at: NaiveDateTime,              // 执行时间
    pub idempotency_key: Option<String>,         // 幂等键 (存在时全局唯一)
    pub reason: Option<String>,                  // 原因说明 (调整类必填)
}
