// ==========================================
// 仓储执行系统 - 主数据导入 Trait
// ==========================================
// 职责: 定义主数据导入接口（不包含实现）
// ==========================================

use crate::domain::master_data::{ImportSummary, RawItemRecord, RawLocationRecord};
use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

// ==========================================
// MasterDataKind - 导入目标类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterDataKind {
    Items,     // 物料档案
    Locations, // 库位档案
}

// ==========================================
// MasterDataImporter Trait
// ==========================================
// 用途: 主数据导入主接口
// 实现者: MasterDataImporterImpl
#[async_trait]
pub trait MasterDataImporter: Send + Sync {
    /// 从文件导入物料档案（.csv/.xlsx/.xls, 按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 逐行 upsert 结果汇总, 行级失败收集进 errors
    /// - Err: 文件读取错误、限额超出、数据库错误等（整文件失败）
    ///
    /// # 导入流程
    /// 1. 文件解析（表头 + 数据行）
    /// 2. 表头检查（必需列 / 未知列策略）
    /// 3. 行数限额检查
    /// 4. 逐行映射与校验（失败行跳过并记录）
    /// 5. 单事务 upsert 落库（按 sku 幂等）
    async fn import_items<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportSummary, Box<dyn Error>>;

    /// 从文件导入库位档案（.csv/.xlsx/.xls, 按扩展名选择解析器）
    ///
    /// 流程与 import_items 相同, 按 code 幂等 upsert
    async fn import_locations<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> Result<ImportSummary, Box<dyn Error>>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 参数
    /// - kind: 全部文件的目标类别
    /// - file_paths: 文件路径列表
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不影响
    /// - 如果某个文件导入失败，不影响其他文件
    async fn import_batch<P: AsRef<Path> + Send + Sync>(
        &self,
        kind: MasterDataKind,
        file_paths: Vec<P>,
    ) -> Result<Vec<Result<ImportSummary, String>>, Box<dyn Error>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    ///
    /// # 返回
    /// - Ok(Vec<HashMap<String, String>>): 行记录列表（空白行已剔除）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<std::collections::HashMap<String, String>>, Box<dyn Error>>;
}

// ==========================================
// RowMapper Trait
// ==========================================
// 用途: 原始行到中间记录的映射（含基础清洗, 不含业务校验）
// 实现者: MasterDataRowMapper
pub trait RowMapper: Send + Sync {
    /// 映射物料行（列: sku / name / uom）
    fn map_to_raw_item(
        &self,
        row: &std::collections::HashMap<String, String>,
    ) -> RawItemRecord;

    /// 映射库位行（列: code / name / type / active）
    ///
    /// # 返回
    /// - Err(String): active 或 type 列的值无法解析（行级错误文本）
    fn map_to_raw_location(
        &self,
        row: &std::collections::HashMap<String, String>,
    ) -> Result<RawLocationRecord, String>;
}
