// ==========================================
// 仓储执行系统 - 主数据导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 表头检查 → 限额检查 → 逐行映射校验 → 单事务 upsert
// 红线: 行级失败只跳过该行并计入汇总; 文件级失败整体中止且零落库
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::master_data::{ImportRowError, ImportSummary};
use crate::domain::types::LocationType;
use crate::importer::error::ImportError;
use crate::importer::master_data_importer_trait::{
    FileParser, MasterDataImporter, MasterDataKind, RowMapper,
};
use crate::repository::master_data_repo::{ItemRepository, LocationRepository};
use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// 物料文件已知列
const ITEM_COLUMNS: [&str; 3] = ["sku", "name", "uom"];

/// 库位文件已知列
const LOCATION_COLUMNS: [&str; 4] = ["code", "name", "type", "active"];

// ==========================================
// MasterDataImporterImpl - 主数据导入器实现
// ==========================================
pub struct MasterDataImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 落库连接 (单事务 upsert)
    conn: Arc<Mutex<Connection>>,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    row_mapper: Box<dyn RowMapper>,
}

impl<C> MasterDataImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 创建新的 MasterDataImporter 实例
    ///
    /// # 参数
    /// - conn: 数据库连接
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    /// - row_mapper: 行映射器
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        config: C,
        file_parser: Box<dyn FileParser>,
        row_mapper: Box<dyn RowMapper>,
    ) -> Self {
        Self {
            conn,
            config,
            file_parser,
            row_mapper,
        }
    }
}

#[async_trait::async_trait]
impl<C> MasterDataImporter for MasterDataImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    /// 从文件导入物料档案
    #[instrument(skip(self, file_path))]
    async fn import_items<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportSummary, Box<dyn Error>> {
        let file_path_str = file_path.as_ref().display().to_string();
        info!(file_path = %file_path_str, "开始导入物料档案");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let raw_rows = self
            .file_parser
            .parse_to_raw_records(file_path.as_ref())
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                format!("文件解析失败: {}", e)
            })?;
        let total_rows = raw_rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2-3: 表头与限额检查 ===
        self.check_headers(&raw_rows, "sku", &ITEM_COLUMNS).await?;
        self.check_row_limit(total_rows).await?;

        // === 步骤 4: 逐行映射与校验 ===
        debug!("步骤 4: 逐行映射与校验");
        let mut valid_rows = Vec::new();
        let mut errors = Vec::new();
        for (idx, row) in raw_rows.iter().enumerate() {
            let row_no = idx + 1;
            let record = self.row_mapper.map_to_raw_item(row);

            let sku = match record.sku {
                Some(sku) => sku,
                None => {
                    errors.push(ImportRowError {
                        row_no,
                        message: "sku 不能为空".to_string(),
                    });
                    continue;
                }
            };
            // 名称缺失时回落到 sku, 计量单位缺失时回落到 EA
            let name = record.name.unwrap_or_else(|| sku.clone());
            let uom = record.uom.unwrap_or_else(|| "EA".to_string());

            valid_rows.push((sku, name, uom));
        }
        info!(
            valid = valid_rows.len(),
            failed = errors.len(),
            "行映射与校验完成"
        );

        // === 步骤 5: 单事务 upsert 落库 ===
        debug!("步骤 5: 单事务 upsert 落库");
        let (inserted, updated) = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| ImportError::DatabaseConnectionError(format!("锁获取失败: {}", e)))?;
            let tx = conn
                .transaction()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

            let mut inserted = 0usize;
            let mut updated = 0usize;
            for (sku, name, uom) in &valid_rows {
                if ItemRepository::upsert_by_sku_tx(&tx, sku, name, uom)? {
                    inserted += 1;
                } else {
                    updated += 1;
                }
            }

            tx.commit()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
            (inserted, updated)
        };

        let summary = ImportSummary {
            total_rows,
            inserted,
            updated,
            skipped: errors.len(),
            errors,
        };
        info!(
            total = summary.total_rows,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "物料档案导入完成"
        );
        Ok(summary)
    }

    /// 从文件导入库位档案
    #[instrument(skip(self, file_path))]
    async fn import_locations<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportSummary, Box<dyn Error>> {
        let file_path_str = file_path.as_ref().display().to_string();
        info!(file_path = %file_path_str, "开始导入库位档案");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let raw_rows = self
            .file_parser
            .parse_to_raw_records(file_path.as_ref())
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                format!("文件解析失败: {}", e)
            })?;
        let total_rows = raw_rows.len();
        info!(total_rows = total_rows, "文件解析完成");

        // === 步骤 2-3: 表头与限额检查 ===
        self.check_headers(&raw_rows, "code", &LOCATION_COLUMNS)
            .await?;
        self.check_row_limit(total_rows).await?;

        // === 步骤 4: 逐行映射与校验 ===
        debug!("步骤 4: 逐行映射与校验");
        let mut valid_rows = Vec::new();
        let mut errors = Vec::new();
        for (idx, row) in raw_rows.iter().enumerate() {
            let row_no = idx + 1;
            let record = match self.row_mapper.map_to_raw_location(row) {
                Ok(record) => record,
                Err(message) => {
                    errors.push(ImportRowError { row_no, message });
                    continue;
                }
            };

            let code = match record.code {
                Some(code) => code,
                None => {
                    errors.push(ImportRowError {
                        row_no,
                        message: "code 不能为空".to_string(),
                    });
                    continue;
                }
            };
            let location_type = match record.location_type {
                Some(raw) => match LocationType::from_str(&raw) {
                    Some(location_type) => location_type,
                    None => {
                        errors.push(ImportRowError {
                            row_no,
                            message: format!("未知库位类型: {}", raw),
                        });
                        continue;
                    }
                },
                None => LocationType::Bulk,
            };
            // 名称缺失时回落到 code, active 缺失时默认激活
            let name = record.name.unwrap_or_else(|| code.clone());
            let active = record.active.unwrap_or(true);

            valid_rows.push((code, name, location_type, active));
        }
        info!(
            valid = valid_rows.len(),
            failed = errors.len(),
            "行映射与校验完成"
        );

        // === 步骤 5: 单事务 upsert 落库 ===
        debug!("步骤 5: 单事务 upsert 落库");
        let (inserted, updated) = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| ImportError::DatabaseConnectionError(format!("锁获取失败: {}", e)))?;
            let tx = conn
                .transaction()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

            let mut inserted = 0usize;
            let mut updated = 0usize;
            for (code, name, location_type, active) in &valid_rows {
                if LocationRepository::upsert_by_code_tx(&tx, code, name, *location_type, *active)?
                {
                    inserted += 1;
                } else {
                    updated += 1;
                }
            }

            tx.commit()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
            (inserted, updated)
        };

        let summary = ImportSummary {
            total_rows,
            inserted,
            updated,
            skipped: errors.len(),
            errors,
        };
        info!(
            total = summary.total_rows,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "库位档案导入完成"
        );
        Ok(summary)
    }

    /// 批量导入多个文件（并发执行）
    async fn import_batch<P: AsRef<Path> + Send + Sync>(
        &self,
        kind: MasterDataKind,
        file_paths: Vec<P>,
    ) -> Result<Vec<Result<ImportSummary, String>>, Box<dyn Error>> {
        use futures::future::join_all;

        info!(kind = ?kind, count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                info!(file = %path_str, "开始导入文件");
                let result = match kind {
                    MasterDataKind::Items => self.import_items(path).await,
                    MasterDataKind::Locations => self.import_locations(path).await,
                };
                match result {
                    Ok(summary) => {
                        info!(
                            file = %path_str,
                            inserted = summary.inserted,
                            updated = summary.updated,
                            "文件导入成功"
                        );
                        Ok(summary)
                    }
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        Ok(results)
    }
}

// 辅助方法
impl<C> MasterDataImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 表头检查: 必需列存在; 未知列按配置拒绝或告警
    ///
    /// 解析结果按行给出, 以首行的键集合还原表头; 空文件直接放行
    async fn check_headers(
        &self,
        raw_rows: &[HashMap<String, String>],
        required: &str,
        known_columns: &[&str],
    ) -> Result<(), Box<dyn Error>> {
        let first_row = match raw_rows.first() {
            Some(row) => row,
            None => return Ok(()),
        };

        if !first_row.contains_key(required) {
            return Err(Box::new(ImportError::MissingColumn(required.to_string())));
        }

        let unknown: Vec<&str> = first_row
            .keys()
            .filter(|k| !known_columns.contains(&k.as_str()))
            .map(|k| k.as_str())
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        let reject = self
            .config
            .get_reject_unknown_columns()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import/reject_unknown_columns".to_string(),
                message: e.to_string(),
            })?;
        if reject {
            return Err(Box::new(ImportError::UnknownColumns(unknown.join(", "))));
        }

        warn!(columns = %unknown.join(", "), "表头存在未知列, 已忽略");
        Ok(())
    }

    /// 行数限额检查
    async fn check_row_limit(&self, total_rows: usize) -> Result<(), Box<dyn Error>> {
        let limit = self
            .config
            .get_max_rows_per_file()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: "import/max_rows_per_file".to_string(),
                message: e.to_string(),
            })?;
        if total_rows > limit {
            return Err(Box::new(ImportError::RowLimitExceeded {
                limit,
                actual: total_rows,
            }));
        }
        Ok(())
    }
}
