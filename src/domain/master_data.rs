// ==========================================
// 仓储执行系统 - 主数据领域模型
// ==========================================
// 职责: 物料 / 库位 / 操作员 等引用数据实体与导入结构
// 红线: 引用数据与核心无业务规则耦合, 核心只读取 active 等标志
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::LocationType;

// ==========================================
// Item - 物料
// ==========================================
// 不可变引用数据; 核心从不修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,                // 物料ID
    pub sku: String,               // SKU (全局唯一)
    pub name: String,              // 显示名称
    pub uom: String,               // 计量单位 (EA/KG/...)
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// Location - 库位
// ==========================================
// 核心只关心 active 标志: 非激活库位拒绝任何移动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,                  // 库位ID
    pub code: String,                // 库位编码 (全局唯一)
    pub name: String,                // 库位名称
    pub location_type: LocationType, // PICK/BULK/STAGING/DOCK
    pub active: bool,                // 是否激活
    pub created_at: NaiveDateTime,   // 创建时间
}

// ==========================================
// Operator - 操作员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,                // 操作员ID
    pub code: String,              // 工号 (全局唯一)
    pub name: String,              // 姓名
    pub active: bool,              // 是否在岗
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// 主数据导入结构
// ==========================================

/// 从文件解析出的原始物料行 (已做基础清洗, 未校验)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItemRecord {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub uom: Option<String>,
}

/// 从文件解析出的原始库位行 (已做基础清洗, 未校验)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocationRecord {
    pub code: Option<String>,
    pub name: Option<String>,
    pub location_type: Option<String>,
    pub active: Option<bool>,
}

/// 单行导入失败明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_no: usize,   // 文件内行号 (从1起, 不含表头)
    pub message: String, // 失败原因
}

// ==========================================
// ImportSummary - 导入结果汇总
// ==========================================
// 用途: 导入接口返回值; 行级失败收集进 errors, 不中断整个文件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,          // 总行数 (不含表头)
    pub inserted: usize,            // 新增
    pub updated: usize,             // 覆盖更新
    pub skipped: usize,             // 跳过 (行校验失败)
    pub errors: Vec<ImportRowError>,// 失败明细
}

impl ImportSummary {
    /// 合并另一份汇总 (批量导入用)
    pub fn merge(&mut self, other: ImportSummary) {
        self.total_rows += other.total_rows;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}
