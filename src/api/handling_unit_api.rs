// ==========================================
// 仓储执行系统 - 托盘 API
// ==========================================
// 职责: 托盘登记、查询与落位/状态维护
// 约束: 托盘必须始终有归属库位; 登记与改位前校验库位存在
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::handling_unit::HandlingUnit;
use crate::domain::types::HandlingUnitStatus;
use crate::repository::handling_unit_repo::HandlingUnitRepository;
use crate::repository::master_data_repo::LocationRepository;

// ==========================================
// 命令对象
// ==========================================

/// 托盘登记命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlingUnitCreateCommand {
    pub hu_code: String,
    pub location_id: String,
    /// 省略时默认 OPEN
    #[serde(default)]
    pub status: Option<HandlingUnitStatus>,
}

/// 托盘维护命令 (全字段可选, 省略即保持)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlingUnitUpdateCommand {
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub status: Option<HandlingUnitStatus>,
}

// ==========================================
// HandlingUnitApi - 托盘 API
// ==========================================
pub struct HandlingUnitApi {
    handling_unit_repo: Arc<HandlingUnitRepository>,
    location_repo: Arc<LocationRepository>,
    config: Arc<ConfigManager>,
}

impl HandlingUnitApi {
    /// 创建新的HandlingUnitApi实例
    pub fn new(
        handling_unit_repo: Arc<HandlingUnitRepository>,
        location_repo: Arc<LocationRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            handling_unit_repo,
            location_repo,
            config,
        }
    }

    /// 托盘登记
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 归属库位不存在
    /// - Err(ApiError::DuplicateKey): 托盘编码已存在
    pub fn create_handling_unit(
        &self,
        cmd: HandlingUnitCreateCommand,
    ) -> ApiResult<HandlingUnit> {
        let hu_code = cmd.hu_code.trim();
        if hu_code.is_empty() || hu_code.len() > 64 {
            return Err(ApiError::InvalidInput(
                "托盘编码必须为1~64个字符".to_string(),
            ));
        }

        // 归属库位必须存在
        self.location_repo
            .find_by_id(&cmd.location_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", cmd.location_id)))?;

        let status = cmd.status.unwrap_or(HandlingUnitStatus::Open);
        let handling_unit = self
            .handling_unit_repo
            .create(hu_code, &cmd.location_id, status)?;

        info!(hu_id = %handling_unit.id, hu_code = %hu_code, "托盘登记成功");
        Ok(handling_unit)
    }

    /// 查询托盘
    pub fn get_handling_unit(&self, hu_id: &str) -> ApiResult<HandlingUnit> {
        self.handling_unit_repo
            .find_by_id(hu_id)?
            .ok_or_else(|| ApiError::NotFound(format!("HandlingUnit(id={})不存在", hu_id)))
    }

    /// 托盘列表 (登记顺序)
    pub fn list_handling_units(&self, limit: Option<i64>) -> ApiResult<Vec<HandlingUnit>> {
        let limit = match limit {
            Some(n) if n > 0 => n,
            Some(_) => return Err(ApiError::InvalidInput("limit 必须大于0".to_string())),
            None => self
                .config
                .get_default_listing_limit()
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?,
        };
        Ok(self.handling_unit_repo.list(limit)?)
    }

    /// 托盘维护 (改位/改状态)
    pub fn update_handling_unit(
        &self,
        hu_id: &str,
        cmd: HandlingUnitUpdateCommand,
    ) -> ApiResult<HandlingUnit> {
        // 先确认存在, 保持 404 语义
        self.get_handling_unit(hu_id)?;

        if let Some(location_id) = &cmd.location_id {
            self.location_repo
                .find_by_id(location_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", location_id)))?;
        }

        self.handling_unit_repo
            .update(hu_id, cmd.location_id.as_deref(), cmd.status)?;

        self.get_handling_unit(hu_id)
    }
}
