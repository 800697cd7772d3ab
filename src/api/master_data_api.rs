// ==========================================
// 仓储执行系统 - 主数据 API
// ==========================================
// 职责: 物料/库位/操作员主数据维护
// 说明: material 面向旧 ERP 系统, 是物料 (item) 的别名视图
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::master_data::{Item, Location, Operator};
use crate::domain::types::LocationType;
use crate::repository::master_data_repo::{ItemRepository, LocationRepository, OperatorRepository};

// ==========================================
// 命令对象
// ==========================================

/// 物料建档命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreateCommand {
    pub sku: String,
    pub name: String,
    pub uom: String,
}

/// 库位建档命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCreateCommand {
    pub code: String,
    pub name: String,
    pub location_type: LocationType,
    #[serde(default)]
    pub active: Option<bool>,
}

/// 库位维护命令 (全字段可选, 省略即保持)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationUpdateCommand {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location_type: Option<LocationType>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// 操作员建档命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorCreateCommand {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
}

// ==========================================
// MasterDataApi - 主数据 API
// ==========================================
pub struct MasterDataApi {
    item_repo: Arc<ItemRepository>,
    location_repo: Arc<LocationRepository>,
    operator_repo: Arc<OperatorRepository>,
    config: Arc<ConfigManager>,
}

impl MasterDataApi {
    /// 创建新的MasterDataApi实例
    pub fn new(
        item_repo: Arc<ItemRepository>,
        location_repo: Arc<LocationRepository>,
        operator_repo: Arc<OperatorRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            item_repo,
            location_repo,
            operator_repo,
            config,
        }
    }

    // ==========================================
    // 物料
    // ==========================================

    /// 物料建档
    ///
    /// # 返回
    /// - Err(ApiError::DuplicateKey): SKU 已存在
    pub fn create_item(&self, cmd: ItemCreateCommand) -> ApiResult<Item> {
        let sku = cmd.sku.trim();
        if sku.is_empty() || sku.len() > 64 {
            return Err(ApiError::InvalidInput("SKU必须为1~64个字符".to_string()));
        }
        let name = cmd.name.trim();
        if name.is_empty() || name.len() > 128 {
            return Err(ApiError::InvalidInput(
                "物料名称必须为1~128个字符".to_string(),
            ));
        }
        let uom = cmd.uom.trim();
        if uom.is_empty() || uom.len() > 16 {
            return Err(ApiError::InvalidInput(
                "计量单位必须为1~16个字符".to_string(),
            ));
        }

        let item = self.item_repo.create(sku, name, uom)?;
        info!(item_id = %item.id, sku = %item.sku, "物料建档成功");
        Ok(item)
    }

    /// 查询物料
    pub fn get_item(&self, item_id: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Item(id={})不存在", item_id)))
    }

    /// 按 SKU 查询物料
    pub fn get_item_by_sku(&self, sku: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_sku(sku)?
            .ok_or_else(|| ApiError::NotFound(format!("Item(sku={})不存在", sku)))
    }

    /// 物料列表 (建档顺序)
    pub fn list_items(&self, limit: Option<i64>) -> ApiResult<Vec<Item>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.item_repo.list(limit)?)
    }

    // ===== material 别名视图 (旧 ERP 对接) =====

    /// material 视图建档, 语义等同 create_item
    pub fn create_material(&self, cmd: ItemCreateCommand) -> ApiResult<Item> {
        self.create_item(cmd)
    }

    /// material 视图查询, 404 按 Material 命名
    pub fn get_material(&self, item_id: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Material(id={})不存在", item_id)))
    }

    /// material 视图列表
    pub fn list_materials(&self, limit: Option<i64>) -> ApiResult<Vec<Item>> {
        self.list_items(limit)
    }

    // ==========================================
    // 库位
    // ==========================================

    /// 库位建档
    ///
    /// # 返回
    /// - Err(ApiError::DuplicateKey): 库位编码已存在
    pub fn create_location(&self, cmd: LocationCreateCommand) -> ApiResult<Location> {
        let code = cmd.code.trim();
        if code.is_empty() || code.len() > 64 {
            return Err(ApiError::InvalidInput(
                "库位编码必须为1~64个字符".to_string(),
            ));
        }
        let name = cmd.name.trim();
        if name.is_empty() || name.len() > 128 {
            return Err(ApiError::InvalidInput(
                "库位名称必须为1~128个字符".to_string(),
            ));
        }

        let location = self.location_repo.create(
            code,
            name,
            cmd.location_type,
            cmd.active.unwrap_or(true),
        )?;
        info!(location_id = %location.id, code = %location.code, "库位建档成功");
        Ok(location)
    }

    /// 查询库位
    pub fn get_location(&self, location_id: &str) -> ApiResult<Location> {
        self.location_repo
            .find_by_id(location_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Location(id={})不存在", location_id)))
    }

    /// 库位列表 (建档顺序)
    pub fn list_locations(&self, limit: Option<i64>) -> ApiResult<Vec<Location>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.location_repo.list(limit)?)
    }

    /// 库位维护
    pub fn update_location(
        &self,
        location_id: &str,
        cmd: LocationUpdateCommand,
    ) -> ApiResult<Location> {
        self.get_location(location_id)?;

        if let Some(name) = &cmd.name {
            let name = name.trim();
            if name.is_empty() || name.len() > 128 {
                return Err(ApiError::InvalidInput(
                    "库位名称必须为1~128个字符".to_string(),
                ));
            }
        }

        self.location_repo.update(
            location_id,
            cmd.name.as_deref().map(str::trim),
            cmd.location_type,
            cmd.active,
        )?;
        self.get_location(location_id)
    }

    // ==========================================
    // 操作员
    // ==========================================

    /// 操作员建档
    ///
    /// # 返回
    /// - Err(ApiError::DuplicateKey): 操作员编码已存在
    pub fn create_operator(&self, cmd: OperatorCreateCommand) -> ApiResult<Operator> {
        let code = cmd.code.trim();
        if code.is_empty() || code.len() > 64 {
            return Err(ApiError::InvalidInput(
                "操作员编码必须为1~64个字符".to_string(),
            ));
        }
        let name = cmd.name.trim();
        if name.is_empty() || name.len() > 128 {
            return Err(ApiError::InvalidInput(
                "操作员名称必须为1~128个字符".to_string(),
            ));
        }

        let operator = self
            .operator_repo
            .create(code, name, cmd.active.unwrap_or(true))?;
        info!(operator_id = %operator.id, code = %operator.code, "操作员建档成功");
        Ok(operator)
    }

    /// 查询操作员
    pub fn get_operator(&self, operator_id: &str) -> ApiResult<Operator> {
        self.operator_repo
            .find_by_id(operator_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Operator(id={})不存在", operator_id)))
    }

    /// 操作员列表 (建档顺序)
    pub fn list_operators(&self, limit: Option<i64>) -> ApiResult<Vec<Operator>> {
        let limit = self.resolve_limit(limit)?;
        Ok(self.operator_repo.list(limit)?)
    }

    /// 操作员维护
    pub fn update_operator(
        &self,
        operator_id: &str,
        name: Option<String>,
        active: Option<bool>,
    ) -> ApiResult<Operator> {
        self.get_operator(operator_id)?;

        if let Some(name) = &name {
            let name = name.trim();
            if name.is_empty() || name.len() > 128 {
                return Err(ApiError::InvalidInput(
                    "操作员名称必须为1~128个字符".to_string(),
                ));
            }
        }

        self.operator_repo
            .update(operator_id, name.as_deref().map(str::trim), active)?;
        self.get_operator(operator_id)
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
}
