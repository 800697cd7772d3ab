// ==========================================
// 仓储执行系统 - 任务领域模型
// ==========================================
// 生命周期红线: 状态转换必须经过引擎校验,终态不可再转换
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{MissionState, MissionType};

// ==========================================
// Mission - 搬运任务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,                          // 任务ID
    pub mission_no: String,                  // 任务单号 (全局唯一, 1-64字符)
    pub mission_type: MissionType,           // 任务类型 (MOVE_HU/MOVE_ITEM)
    pub state: MissionState,                 // 生命周期状态
    pub priority: i32,                       // 优先级 (>=0)
    pub created_by_operator_id: String,      // 创建操作员 (不可变)
    pub assigned_executor_id: Option<String>,// 指派执行者 (assign 时设置)
    pub created_at: NaiveDateTime,           // 创建时间
    pub started_at: Option<NaiveDateTime>,   // 开始时间
    pub completed_at: Option<NaiveDateTime>, // 完成时间
    pub cancel_reason: Option<String>,       // 取消原因 (<=500字符)
}

impl Mission {
    /// 判断是否处于终态
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// ==========================================
// MissionLinePayload - 行项载荷
// ==========================================
// 整托搬运与物料搬运的分支在类型层面封闭,
// "既无物料也无托盘"的行项不可构造
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionLinePayload {
    /// 整托搬运: 移动整个托盘
    MoveHandlingUnit { hu_id: String },
    /// 物料搬运: 移动指定数量的物料, 可选默认来源/目标托盘
    MoveItem {
        item_id: String,
        hu_id: Option<String>,
    },
}

impl MissionLinePayload {
    /// 从数据库的两个可空列还原载荷 (两者皆空则返回 None)
    pub fn from_columns(item_id: Option<String>, hu_id: Option<String>) -> Option<Self> {
        match (item_id, hu_id) {
            (Some(item_id), hu_id) => Some(MissionLinePayload::MoveItem { item_id, hu_id }),
            (None, Some(hu_id)) => Some(MissionLinePayload::MoveHandlingUnit { hu_id }),
            (None, None) => None,
        }
    }

    /// 拆解为数据库的两个可空列 (item_id, hu_id)
    pub fn to_columns(&self) -> (Option<&str>, Option<&str>) {
        match self {
            MissionLinePayload::MoveHandlingUnit { hu_id } => (None, Some(hu_id.as_str())),
            MissionLinePayload::MoveItem { item_id, hu_id } => {
                (Some(item_id.as_str()), hu_id.as_deref())
            }
        }
    }

    /// 行项涉及的物料 (整托搬运时为 None)
    pub fn item_id(&self) -> Option<&str> {
        match self {
            MissionLinePayload::MoveHandlingUnit { .. } => None,
            MissionLinePayload::MoveItem { item_id, .. } => Some(item_id.as_str()),
        }
    }

    /// 行项声明的托盘 (物料搬运时可能为 None)
    pub fn hu_id(&self) -> Option<&str> {
        match self {
            MissionLinePayload::MoveHandlingUnit { hu_id } => Some(hu_id.as_str()),
            MissionLinePayload::MoveItem { hu_id, .. } => hu_id.as_deref(),
        }
    }
}

// ==========================================
// MissionLine - 任务行项
// ==========================================
// 一条 from->to 的搬运需求; qty_done 单调不减且不超过 qty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionLine {
    pub id: String,                  // 行项ID
    pub mission_id: String,          // 所属任务
    pub from_location_id: String,    // 来源库位
    pub to_location_id: String,      // 目标库位 (必须不同于来源)
    pub payload: MissionLinePayload, // 载荷 (整托/物料)
    pub qty: f64,                    // 需求数量 (>0)
    pub qty_done: f64,               // 已完成数量 (0 <= qty_done <= qty)
}

impl MissionLine {
    /// 剩余需求数量
    pub fn remaining_qty(&self) -> f64 {
        self.qty - self.qty_done
    }

    /// 行项是否已全部完成 (严格等量)
    pub fn is_fulfilled(&self) -> bool {
        self.qty_done >= self.qty
    }
}

// ==========================================
// MissionWithLines - 任务 + 行项组合
// ==========================================
/// 用于查询返回的任务完整视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionWithLines {
    pub mission: Mission,
    pub lines: Vec<MissionLine>,
}
