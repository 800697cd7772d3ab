// ==========================================
// 仓储执行系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 任务状态 (Mission State)
// ==========================================
// 生命周期: DRAFT -> ASSIGNED -> IN_PROGRESS -> COMPLETED
// 终态: COMPLETED / CANCELLED (不允许任何再转换,包括自身)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    Draft,      // 草稿
    Assigned,   // 已指派
    InProgress, // 执行中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionState::Draft => write!(f, "DRAFT"),
            MissionState::Assigned => write!(f, "ASSIGNED"),
            MissionState::InProgress => write!(f, "IN_PROGRESS"),
            MissionState::Completed => write!(f, "COMPLETED"),
            MissionState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl MissionState {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(MissionState::Draft),
            "ASSIGNED" => Some(MissionState::Assigned),
            "IN_PROGRESS" => Some(MissionState::InProgress),
            "COMPLETED" => Some(MissionState::Completed),
            "CANCELLED" => Some(MissionState::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MissionState::Draft => "DRAFT",
            MissionState::Assigned => "ASSIGNED",
            MissionState::InProgress => "IN_PROGRESS",
            MissionState::Completed => "COMPLETED",
            MissionState::Cancelled => "CANCELLED",
        }
    }

    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionState::Completed | MissionState::Cancelled)
    }
}

// ==========================================
// 任务类型 (Mission Type)
// ==========================================
// MOVE_HU: 整托搬运 / MOVE_ITEM: 按物料数量搬运
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionType {
    MoveHu,   // 整托搬运
    MoveItem, // 物料搬运
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionType::MoveHu => write!(f, "MOVE_HU"),
            MissionType::MoveItem => write!(f, "MOVE_ITEM"),
        }
    }
}

impl MissionType {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MOVE_HU" => Some(MissionType::MoveHu),
            "MOVE_ITEM" => Some(MissionType::MoveItem),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MissionType::MoveHu => "MOVE_HU",
            MissionType::MoveItem => "MOVE_ITEM",
        }
    }
}

// ==========================================
// 执行者类型 (Executor Type)
// ==========================================
// HUMAN 受 500kg 硬上限约束(与配置载荷无关)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorType {
    Human, // 人工
    Agv,   // 自动搬运车
}

impl fmt::Display for ExecutorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorType::Human => write!(f, "HUMAN"),
            ExecutorType::Agv => write!(f, "AGV"),
        }
    }
}

impl ExecutorType {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HUMAN" => Some(ExecutorType::Human),
            "AGV" => Some(ExecutorType::Agv),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExecutorType::Human => "HUMAN",
            ExecutorType::Agv => "AGV",
        }
    }
}

// ==========================================
// 托盘状态 (Handling Unit Status)
// ==========================================
// SEALED / BLOCKED 的托盘不允许作为移动来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandlingUnitStatus {
    Open,    // 可用
    Sealed,  // 封箱
    Blocked, // 冻结
}

impl fmt::Display for HandlingUnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlingUnitStatus::Open => write!(f, "OPEN"),
            HandlingUnitStatus::Sealed => write!(f, "SEALED"),
            HandlingUnitStatus::Blocked => write!(f, "BLOCKED"),
        }
    }
}

impl HandlingUnitStatus {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(HandlingUnitStatus::Open),
            "SEALED" => Some(HandlingUnitStatus::Sealed),
            "BLOCKED" => Some(HandlingUnitStatus::Blocked),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            HandlingUnitStatus::Open => "OPEN",
            HandlingUnitStatus::Sealed => "SEALED",
            HandlingUnitStatus::Blocked => "BLOCKED",
        }
    }
}

// ==========================================
// 库位类型 (Location Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Pick,    // 拣选位
    Bulk,    // 存储位
    Staging, // 暂存位
    Dock,    // 月台
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Pick => write!(f, "PICK"),
            LocationType::Bulk => write!(f, "BULK"),
            LocationType::Staging => write!(f, "STAGING"),
            LocationType::Dock => write!(f, "DOCK"),
        }
    }
}

impl LocationType {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PICK" => Some(LocationType::Pick),
            "BULK" => Some(LocationType::Bulk),
            "STAGING" => Some(LocationType::Staging),
            "DOCK" => Some(LocationType::Dock),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LocationType::Pick => "PICK",
            LocationType::Bulk => "BULK",
            LocationType::Staging => "STAGING",
            LocationType::Dock => "DOCK",
        }
    }
}

// ==========================================
// 移动类型 (Movement Type)
// ==========================================
// MOVE: 任务驱动的物理移动 / ADJUSTMENT: 直接库存调整
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Move,       // 物理移动
    Adjustment, // 库存调整
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Move => write!(f, "MOVE"),
            MovementType::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

impl MovementType {
    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MOVE" => Some(MovementType::Move),
            "ADJUSTMENT" => Some(MovementType::Adjustment),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MovementType::Move => "MOVE",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }
}
