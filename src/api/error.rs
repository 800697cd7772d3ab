// ==========================================
// 仓储执行系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository/Engine 错误为用户友好的错误消息
// 约束: 所有错误信息必须包含显式原因, 操作员无需二次查询即可理解
// 约束: 并发冲突 (ConflictError) 与一般业务违规分开上抛,
//       调用方据此区分 "瞬时竞争可重试" 与 "输入本身非法"
// ==========================================

use crate::engine::movement_check::MovementRuleViolation;
use crate::engine::transition::TransitionViolation;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 业务规则违反; 载荷是对外契约的英文规则文案
    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    /// 版本校验失败或数量将为负, 未发生任何变更
    #[error("并发冲突: {0}")]
    ConflictError(String),

    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    /// 唯一键冲突 (任务编号 / 幂等键 / 托盘物料组合等)
    #[error("唯一键冲突: {0}")]
    DuplicateKey(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP 风格状态码提示 (传输层挂接时直接使用)
    ///
    /// - 404: 实体缺失
    /// - 409: 业务规则 / 状态转换 / 并发与唯一键冲突
    /// - 400: 输入或数据校验失败
    /// - 500: 其余基础设施错误
    pub fn status_hint(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BusinessRuleViolation(_)
            | ApiError::InvalidStateTransition { .. }
            | ApiError::ConflictError(_)
            | ApiError::OptimisticLockFailure(_)
            | ApiError::DuplicateKey(_) => 409,
            ApiError::InvalidInput(_) | ApiError::ValidationError(_) | ApiError::ImportError(_) => {
                400
            }
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_)
            | ApiError::InternalError(_)
            | ApiError::Other(_) => 500,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "{}(id={})已被并发修改 (期望version={}, 实际version={})",
                entity, id, expected, actual
            )),
            RepositoryError::VersionConflict { message } => ApiError::ConflictError(message),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::DuplicateKey(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 Engine 校验错误转换
// 规则文案即对外契约, 原样进入载荷
// ==========================================
impl From<TransitionViolation> for ApiError {
    fn from(err: TransitionViolation) -> Self {
        match err {
            TransitionViolation::InvalidTransition { from, to } => {
                ApiError::InvalidStateTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                }
            }
            other => ApiError::BusinessRuleViolation(other.to_string()),
        }
    }
}

impl From<MovementRuleViolation> for ApiError {
    fn from(err: MovementRuleViolation) -> Self {
        ApiError::BusinessRuleViolation(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
