// ==========================================
// 仓储执行系统 - API 层
// ==========================================
// 职责: 对外业务接口, 编排仓储/引擎完成命令与查询
// ==========================================

pub mod error;
pub mod executor_api;
pub mod handling_unit_api;
pub mod inventory_api;
pub mod master_data_api;
pub mod mission_api;
pub mod rule_check_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use executor_api::{
    ExecutorApi, ExecutorCreateCommand, ExecutorUpdateCommand, ExecutorWithLiveness,
    VehicleCreateCommand,
};
pub use handling_unit_api::{HandlingUnitApi, HandlingUnitCreateCommand, HandlingUnitUpdateCommand};
pub use inventory_api::{AdjustInventoryCommand, InventoryApi};
pub use master_data_api::{
    ItemCreateCommand, LocationCreateCommand, LocationUpdateCommand, MasterDataApi,
    OperatorCreateCommand,
};
pub use mission_api::{
    MissionApi, MissionCreateCommand, MissionLineDraft, RecordMovementCommand,
};
pub use rule_check_api::{
    AssignmentCheckRequest, MovementCheckRequest, RuleCheckApi, RuleCheckOutcome,
};
