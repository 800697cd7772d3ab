// ==========================================
// 仓储执行系统 - 托盘领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::HandlingUnitStatus;

// ==========================================
// HandlingUnit - 托盘
// ==========================================
// location_id 为当前所在库位; 正常情况下只通过已完成的
// 整托搬运变更, 引用数据修正走显式 relocate 接口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlingUnit {
    pub id: String,                 // 托盘ID
    pub hu_code: String,            // 托盘编码 (全局唯一)
    pub location_id: String,        // 当前库位
    pub status: HandlingUnitStatus, // OPEN / SEALED / BLOCKED
    pub created_at: NaiveDateTime,  // 创建时间
}

impl HandlingUnit {
    /// 是否允许作为移动来源 (SEALED/BLOCKED 不允许)
    pub fn is_movable_source(&self) -> bool {
        self.status == HandlingUnitStatus::Open
    }
}
