// ==========================================
// 仓储执行系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod executor;
pub mod handling_unit;
pub mod inventory;
pub mod master_data;
pub mod mission;
pub mod types;

// 重导出核心类型
pub use executor::{Executor, HUMAN_PAYLOAD_CEILING_KG};
pub use handling_unit::HandlingUnit;
pub use inventory::{InventoryMovement, InventoryPosition};
pub use master_data::{
    ImportRowError, ImportSummary, Item, Location, Operator, RawItemRecord, RawLocationRecord,
};
pub use mission::{Mission, MissionLine, MissionLinePayload, MissionWithLines};
