// ==========================================
// 仓储执行系统 - 执行者领域模型
// ==========================================
// 红线: 人工执行者受 500kg 硬上限约束, 与配置的最大载荷无关
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::ExecutorType;

/// 人工执行者单次搬运硬上限 (kg)
pub const HUMAN_PAYLOAD_CEILING_KG: f64 = 500.0;

// ==========================================
// Executor - 执行者
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Executor {
    pub id: String,                         // 执行者ID
    pub code: String,                       // 编码 (全局唯一)
    pub name: String,                       // 名称
    pub executor_type: ExecutorType,        // HUMAN / AGV
    pub max_payload_kg: f64,                // 配置最大载荷 (kg)
    pub active: bool,                       // 是否可接受任务
    pub last_seen_at: Option<NaiveDateTime>,// 最近心跳时间
    pub created_at: NaiveDateTime,          // 创建时间
}

impl Executor {
    /// 是否人工执行者
    pub fn is_human(&self) -> bool {
        self.executor_type == ExecutorType::Human
    }
}
