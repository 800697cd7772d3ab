// ==========================================
// 仓储执行系统 - 导入层
// ==========================================
// 职责: 外部主数据导入 (物料/库位档案)
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod master_data_importer_impl;
pub mod master_data_importer_trait;
pub mod row_mapper;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use master_data_importer_impl::MasterDataImporterImpl;
pub use row_mapper::MasterDataRowMapper;

// 重导出 Trait 接口
pub use master_data_importer_trait::{FileParser, MasterDataImporter, MasterDataKind, RowMapper};
