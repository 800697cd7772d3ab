// ==========================================
// 仓储执行系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 仓储执行层 (任务驱动的库存移动与台账记录)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ExecutorType, HandlingUnitStatus, LocationType, MissionState, MissionType, MovementType,
};

// 领域实体
pub use domain::{
    Executor, HandlingUnit, InventoryMovement, InventoryPosition, Item, Location, Mission,
    MissionLine, MissionLinePayload, MissionWithLines, Operator,
};

// 引擎
pub use engine::{
    ensure_transition, validate_assign, validate_cancel, validate_complete, validate_movement,
    validate_start, MovementCheckContext, MovementRuleViolation, TransitionViolation,
};

// API
pub use api::{ExecutorApi, HandlingUnitApi, InventoryApi, MasterDataApi, MissionApi, RuleCheckApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储执行系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
