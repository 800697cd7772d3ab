// ==========================================
// 仓储执行系统 - 主数据行映射器
// ==========================================
// 职责: 原始行记录 (HashMap) 到中间记录的映射与基础清洗
// 红线: 只做 TRIM/NULL 标准化与类型解析, 不做业务校验
// ==========================================

use crate::domain::master_data::{RawItemRecord, RawLocationRecord};
use crate::importer::master_data_importer_trait::RowMapper;
use std::collections::HashMap;

// ==========================================
// MasterDataRowMapper - 行映射器实现
// ==========================================
pub struct MasterDataRowMapper;

impl MasterDataRowMapper {
    /// 取列值并标准化: TRIM 后空串视为 NULL
    fn take_text(row: &HashMap<String, String>, column: &str) -> Option<String> {
        row.get(column)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 解析布尔标记 (1/0, true/false, yes/no, 是/否)
    fn parse_bool_flag(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "是" => Some(true),
            "0" | "false" | "no" | "n" | "否" => Some(false),
            _ => None,
        }
    }
}

impl RowMapper for MasterDataRowMapper {
    fn map_to_raw_item(&self, row: &HashMap<String, String>) -> RawItemRecord {
        RawItemRecord {
            sku: Self::take_text(row, "sku"),
            name: Self::take_text(row, "name"),
            uom: Self::take_text(row, "uom").map(|v| v.to_uppercase()),
        }
    }

    fn map_to_raw_location(
        &self,
        row: &HashMap<String, String>,
    ) -> Result<RawLocationRecord, String> {
        let active = match Self::take_text(row, "active") {
            Some(raw) => match Self::parse_bool_flag(&raw) {
                Some(flag) => Some(flag),
                None => {
                    return Err(format!("active 列的值无法解析: {}", raw));
                }
            },
            None => None,
        };

        Ok(RawLocationRecord {
            code: Self::take_text(row, "code"),
            name: Self::take_text(row, "name"),
            location_type: Self::take_text(row, "type").map(|v| v.to_uppercase()),
            active,
        })
    }
}
