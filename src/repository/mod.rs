// ==========================================
// 仓储执行系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: *_tx 关联函数供跨仓储事务编排调用, 不自行开启事务
// ==========================================

pub mod error;
pub mod executor_repo;
pub mod handling_unit_repo;
pub mod inventory_repo;
pub mod master_data_repo;
pub mod mission_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use executor_repo::ExecutorRepository;
pub use handling_unit_repo::HandlingUnitRepository;
pub use inventory_repo::{InventoryMovementRepository, InventoryPositionRepository};
pub use master_data_repo::{ItemRepository, LocationRepository, OperatorRepository};
pub use mission_repo::MissionRepository;
