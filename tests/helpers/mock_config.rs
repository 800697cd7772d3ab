// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use std::error::Error;
use warehouse_wes::config::ImportConfigReader;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub max_rows_per_file: usize,
    pub reject_unknown_columns: bool,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            max_rows_per_file: 50_000,
            reject_unknown_columns: false,
        }
    }

    /// 创建单文件行数上限受限的配置
    pub fn with_max_rows(max_rows: usize) -> Self {
        let mut config = Self::default();
        config.max_rows_per_file = max_rows;
        config
    }

    /// 创建拒绝未知列的严格配置
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.reject_unknown_columns = true;
        config
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_max_rows_per_file(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.max_rows_per_file)
    }

    async fn get_reject_unknown_columns(&self) -> Result<bool, Box<dyn Error>> {
        Ok(self.reject_unknown_columns)
    }
}
