// ==========================================
// 仓储执行系统 - 执行者 API
// ==========================================
// 职责: 执行者注册、查询、维护与心跳
// 说明: vehicle 面向旧调度系统, 是 AGV 执行者的别名视图;
//       非 AGV 执行者对 vehicle 接口不可见 (按不存在处理)
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::executor::Executor;
use crate::domain::types::ExecutorType;
use crate::repository::executor_repo::ExecutorRepository;

use chrono::{Duration, Utc};

// ==========================================
// 命令与视图对象
// ==========================================

/// 执行者注册命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorCreateCommand {
    pub code: String,
    pub name: String,
    pub executor_type: ExecutorType,
    pub max_payload_kg: f64,
    /// 省略时默认激活
    #[serde(default)]
    pub active: Option<bool>,
}

/// 执行者维护命令 (全字段可选, 省略即保持)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorUpdateCommand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub executor_type: Option<ExecutorType>,
    #[serde(default)]
    pub max_payload_kg: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// 车辆注册命令 (别名视图, 固定注册为 AGV)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleCreateCommand {
    pub code: String,
    pub name: String,
    pub max_payload_kg: f64,
}

/// 带失联标记的执行者视图
///
/// stale: 最近心跳早于 executor/stale_after_minutes 阈值
/// (从未上报心跳按失联处理)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorWithLiveness {
    pub executor: Executor,
    pub stale: bool,
}

// ==========================================
// ExecutorApi - 执行者 API
// ==========================================
pub struct ExecutorApi {
    executor_repo: Arc<ExecutorRepository>,
    config: Arc<ConfigManager>,
}

impl ExecutorApi {
    /// 创建新的ExecutorApi实例
    pub fn new(executor_repo: Arc<ExecutorRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            executor_repo,
            config,
        }
    }

    // ==========================================
    // 执行者主接口
    // ==========================================

    /// 执行者注册
    ///
    /// # 返回
    /// - Err(ApiError::DuplicateKey): 执行者编码已存在
    pub fn create_executor(&self, cmd: ExecutorCreateCommand) -> ApiResult<Executor> {
        Self::validate_code(&cmd.code)?;
        Self::validate_name(&cmd.name)?;
        Self::validate_payload(cmd.max_payload_kg)?;

        let executor = self.executor_repo.create(
            cmd.code.trim(),
            cmd.name.trim(),
            cmd.executor_type,
            cmd.max_payload_kg,
            cmd.active.unwrap_or(true),
        )?;

        info!(executor_id = %executor.id, code = %executor.code, executor_type = ?executor.executor_type, "执行者注册成功");
        Ok(executor)
    }

    /// 查询执行者
    pub fn get_executor(&self, executor_id: &str) -> ApiResult<Executor> {
        self.executor_repo
            .find_by_id(executor_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Executor(id={})不存在", executor_id)))
    }

    /// 执行者列表 (可按类型过滤, 附带失联标记)
    pub fn list_executors(
        &self,
        executor_type: Option<ExecutorType>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<ExecutorWithLiveness>> {
        let limit = self.resolve_limit(limit)?;
        let stale_after_minutes = self
            .config
            .get_executor_stale_after_minutes()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let cutoff = Utc::now().naive_utc() - Duration::minutes(stale_after_minutes);

        let executors = self.executor_repo.list(executor_type, limit)?;
        Ok(executors
            .into_iter()
            .map(|executor| {
                let stale = match executor.last_seen_at {
                    Some(seen_at) => seen_at < cutoff,
                    None => true,
                };
                ExecutorWithLiveness { executor, stale }
            })
            .collect())
    }

    /// 执行者维护
    pub fn update_executor(
        &self,
        executor_id: &str,
        cmd: ExecutorUpdateCommand,
    ) -> ApiResult<Executor> {
        if let Some(name) = &cmd.name {
            Self::validate_name(name)?;
        }
        if let Some(max_payload_kg) = cmd.max_payload_kg {
            Self::validate_payload(max_payload_kg)?;
        }

        self.executor_repo.update(
            executor_id,
            cmd.name.as_deref().map(str::trim),
            cmd.executor_type,
            cmd.max_payload_kg,
            cmd.active,
            None,
        )?;
        self.get_executor(executor_id)
    }

    /// 心跳: 刷新最近在线时间, 返回刷新后的执行者
    pub fn heartbeat(&self, executor_id: &str) -> ApiResult<Executor> {
        self.executor_repo.touch_last_seen(executor_id)?;
        self.get_executor(executor_id)
    }

    // ==========================================
    // 车辆别名视图 (仅 AGV)
    // ==========================================

    /// 车辆注册: 固定类型 AGV, 默认激活
    pub fn create_vehicle(&self, cmd: VehicleCreateCommand) -> ApiResult<Executor> {
        self.create_executor(ExecutorCreateCommand {
            code: cmd.code,
            name: cmd.name,
            executor_type: ExecutorType::Agv,
            max_payload_kg: cmd.max_payload_kg,
            active: Some(true),
        })
    }

    /// 查询车辆: 非 AGV 执行者按不存在处理
    pub fn get_vehicle(&self, executor_id: &str) -> ApiResult<Executor> {
        match self.executor_repo.find_by_id(executor_id)? {
            Some(executor) if executor.executor_type == ExecutorType::Agv => Ok(executor),
            _ => Err(ApiError::NotFound(format!(
                "Vehicle(id={})不存在",
                executor_id
            ))),
        }
    }

    /// 车辆列表 (仅 AGV)
    pub fn list_vehicles(&self, limit: Option<i64>) -> ApiResult<Vec<Executor>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.executor_repo.list(Some(ExecutorType::Agv), limit)?)
    }

    /// 车辆维护: 类型不可改, 非 AGV 按不存在处理
    pub fn update_vehicle(
        &self,
        executor_id: &str,
        name: Option<String>,
        max_payload_kg: Option<f64>,
        active: Option<bool>,
    ) -> ApiResult<Executor> {
        self.get_vehicle(executor_id)?;

        if let Some(name) = &name {
            Self::validate_name(name)?;
        }
        if let Some(max_payload_kg) = max_payload_kg {
            Self::validate_payload(max_payload_kg)?;
        }

        self.executor_repo.update(
            executor_id,
            name.as_deref().map(str::trim),
            None,
            max_payload_kg,
            active,
            None,
        )?;
        self.get_vehicle(executor_id)
    }

    // ==========================================
    // 内部
    // ==========================================

    fn resolve_limit(&self, limit: Option<i64>) -> ApiResult<i64> {
        match limit {
            Some(n) if n > 0 => Ok(n),
            Some(_) => Err(ApiError::InvalidInput("limit 必须大于0".to_string())),
            None => self
                .config
                .get_default_listing_limit()
                .map_err(|e| ApiError::DatabaseError(e.to_string())),
        }
    }

    fn validate_code(code: &str) -> ApiResult<()> {
        let code = code.trim();
        if code.is_empty() || code.len() > 64 {
            return Err(ApiError::InvalidInput(
                "执行者编码必须为1~64个字符".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_name(name: &str) -> ApiResult<()> {
        let name = name.trim();
        if name.is_empty() || name.len() > 128 {
            return Err(ApiError::InvalidInput(
                "执行者名称必须为1~128个字符".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_payload(max_payload_kg: f64) -> ApiResult<()> {
        if max_payload_kg <= 0.0 {
            return Err(ApiError::InvalidInput(
                "最大载荷必须大于0".to_string(),
            ));
        }
        Ok(())
    }
}
