// ==========================================
// 仓储执行系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 导入限额配置 =====

    /// 获取单文件最大行数
    ///
    /// # 返回
    /// - usize: 超过该行数的文件整体拒绝
    ///
    /// # 默认值
    /// - 50000
    async fn get_max_rows_per_file(&self) -> Result<usize, Box<dyn Error>>;

    /// 是否拒绝含未知列的文件
    ///
    /// # 返回
    /// - true: 表头出现未知列时整文件拒绝
    /// - false: 未知列仅记录警告并忽略
    ///
    /// # 默认值
    /// - false
    async fn get_reject_unknown_columns(&self) -> Result<bool, Box<dyn Error>>;
}
