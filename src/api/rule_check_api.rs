// ==========================================
// 仓储执行系统 - 规则预检 API
// ==========================================
// 职责: 指派/移动的无副作用预检 (dry-run)
// 约束: 预检结论以 allowed/reason 返回, 引用缺失不算错误;
//       只有基础设施故障 (数据库等) 才以 Err 上抛
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiResult;
use crate::engine::movement_check::{validate_movement, MovementCheckContext};
use crate::engine::transition::validate_assign;
use crate::repository::executor_repo::ExecutorRepository;
use crate::repository::handling_unit_repo::HandlingUnitRepository;
use crate::repository::master_data_repo::LocationRepository;
use crate::repository::mission_repo::MissionRepository;

// ==========================================
// 请求与结论对象
// ==========================================

/// 指派预检请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentCheckRequest {
    pub mission_id: String,
    pub executor_id: String,
}

/// 移动预检请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementCheckRequest {
    pub mission_id: String,
    pub mission_line_id: String,
    pub executor_id: String,
    pub qty: f64,
}

/// 预检结论
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCheckOutcome {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl RuleCheckOutcome {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

// ==========================================
// RuleCheckApi - 规则预检 API
// ==========================================
pub struct RuleCheckApi {
    mission_repo: Arc<MissionRepository>,
    executor_repo: Arc<ExecutorRepository>,
    location_repo: Arc<LocationRepository>,
    handling_unit_repo: Arc<HandlingUnitRepository>,
}

impl RuleCheckApi {
    /// 创建新的RuleCheckApi实例
    pub fn new(
        mission_repo: Arc<MissionRepository>,
        executor_repo: Arc<ExecutorRepository>,
        location_repo: Arc<LocationRepository>,
        handling_unit_repo: Arc<HandlingUnitRepository>,
    ) -> Self {
        Self {
            mission_repo,
            executor_repo,
            location_repo,
            handling_unit_repo,
        }
    }

    /// 指派预检: 执行与 assign 完全相同的规则, 零副作用
    pub fn validate_assignment(
        &self,
        request: &AssignmentCheckRequest,
    ) -> ApiResult<RuleCheckOutcome> {
        let mission = self.mission_repo.find_with_lines(&request.mission_id)?;
        let executor = self.executor_repo.find_by_id(&request.executor_id)?;

        let (mission, executor) = match (mission, executor) {
            (Some(m), Some(e)) => (m, e),
            _ => {
                return Ok(RuleCheckOutcome::denied("Mission or executor not found"));
            }
        };

        let outcome = match validate_assign(&mission, &executor) {
            Ok(()) => RuleCheckOutcome::allowed(),
            Err(violation) => RuleCheckOutcome::denied(violation.to_string()),
        };
        debug!(
            mission_id = %request.mission_id,
            executor_id = %request.executor_id,
            allowed = outcome.allowed,
            "指派预检完成"
        );
        Ok(outcome)
    }

    /// 移动预检: 执行与 record_movement 完全相同的纯校验, 零副作用
    ///
    /// 行项托盘引用悬空时按无托盘继续预检 (与执行路径的 404 不同,
    /// 预检只回答"规则会怎么判")
    pub fn validate_movement_check(
        &self,
        request: &MovementCheckRequest,
    ) -> ApiResult<RuleCheckOutcome> {
        let mission = self.mission_repo.find_with_lines(&request.mission_id)?;
        let line = self.mission_repo.find_line_by_id(&request.mission_line_id)?;
        let executor = self.executor_repo.find_by_id(&request.executor_id)?;

        let (mission, line, executor) = match (mission, line, executor) {
            (Some(m), Some(l), Some(e)) => (m, l, e),
            _ => {
                return Ok(RuleCheckOutcome::denied(
                    "Mission, line, or executor not found",
                ));
            }
        };

        let source = self.location_repo.find_by_id(&line.from_location_id)?;
        let destination = self.location_repo.find_by_id(&line.to_location_id)?;
        let (source, destination) = match (source, destination) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                return Ok(RuleCheckOutcome::denied("Mission line locations not found"));
            }
        };

        let handling_unit = match line.payload.hu_id() {
            Some(hu_id) => self.handling_unit_repo.find_by_id(hu_id)?,
            None => None,
        };

        let outcome = match validate_movement(&MovementCheckContext {
            mission: &mission.mission,
            line: &line,
            executor: &executor,
            source: &source,
            destination: &destination,
            qty: request.qty,
            handling_unit: handling_unit.as_ref(),
        }) {
            Ok(()) => RuleCheckOutcome::allowed(),
            Err(violation) => RuleCheckOutcome::denied(violation.to_string()),
        };
        debug!(
            mission_id = %request.mission_id,
            mission_line_id = %request.mission_line_id,
            allowed = outcome.allowed,
            "移动预检完成"
        );
        Ok(outcome)
    }
}
