// ==========================================
// 仓储执行系统 - 任务状态机
// ==========================================
// 职责: 任务生命周期转换表与各转换的前置校验
// 红线: 无状态、无副作用、无 I/O 操作
// 状态机: DRAFT -> ASSIGNED -> IN_PROGRESS -> COMPLETED
//         任意非终态 -> CANCELLED (特例, 不走转换表)
// ==========================================

use thiserror::Error;

use crate::domain::executor::Executor;
use crate::domain::mission::{Mission, MissionWithLines};
use crate::domain::types::MissionState;

/// 状态转换校验失败
///
/// 错误文案是对外服务契约的一部分, 操作员直接可读, 不得随意改动
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionViolation {
    #[error("Invalid mission transition: {from} -> {to}")]
    InvalidTransition { from: MissionState, to: MissionState },

    #[error("Executor is inactive")]
    ExecutorInactive,

    #[error("Mission must have at least one line before assignment")]
    MissionHasNoLines,

    #[error("Only the assigned executor can start this mission")]
    NotAssignedExecutor,

    #[error("All mission lines must be complete before finishing: {0:?}")]
    IncompleteLines(Vec<String>),

    #[error("Cancel reason is required")]
    CancelReasonRequired,

    #[error("Completed or cancelled mission cannot be cancelled")]
    CancelOnTerminalState,
}

/// 通用转换表: 当前状态允许到达的目标状态
///
/// 表是全量且精确的; 终态不允许任何转换 (包括自身)。
/// 取消不在此表内, 走 validate_cancel 的特例判定。
pub fn allowed_transitions(current: MissionState) -> &'static [MissionState] {
    match current {
        MissionState::Draft => &[MissionState::Assigned, MissionState::Cancelled],
        MissionState::Assigned => &[MissionState::InProgress, MissionState::Cancelled],
        MissionState::InProgress => &[MissionState::Completed, MissionState::Cancelled],
        MissionState::Completed | MissionState::Cancelled => &[],
    }
}

/// 校验单步状态转换
pub fn ensure_transition(
    current: MissionState,
    target: MissionState,
) -> Result<(), TransitionViolation> {
    if !allowed_transitions(current).contains(&target) {
        return Err(TransitionViolation::InvalidTransition {
            from: current,
            to: target,
        });
    }
    Ok(())
}

/// 指派前置校验: DRAFT -> ASSIGNED
///
/// # 规则
/// 1. 转换表允许
/// 2. 执行者必须激活
/// 3. 任务必须至少有一个行项
pub fn validate_assign(
    mission: &MissionWithLines,
    executor: &Executor,
) -> Result<(), TransitionViolation> {
    ensure_transition(mission.mission.state, MissionState::Assigned)?;

    if !executor.active {
        return Err(TransitionViolation::ExecutorInactive);
    }

    if mission.lines.is_empty() {
        return Err(TransitionViolation::MissionHasNoLines);
    }

    Ok(())
}

/// 启动前置校验: ASSIGNED -> IN_PROGRESS
///
/// # 规则
/// 1. 转换表允许
/// 2. 只有被指派的执行者本人可以启动
/// 3. 执行者必须激活
pub fn validate_start(
    mission: &MissionWithLines,
    executor: &Executor,
) -> Result<(), TransitionViolation> {
    ensure_transition(mission.mission.state, MissionState::InProgress)?;

    if mission.mission.assigned_executor_id.as_deref() != Some(executor.id.as_str()) {
        return Err(TransitionViolation::NotAssignedExecutor);
    }

    if !executor.active {
        return Err(TransitionViolation::ExecutorInactive);
    }

    Ok(())
}

/// 完成前置校验: IN_PROGRESS -> COMPLETED
///
/// # 规则
/// 1. 转换表允许
/// 2. 全部行项 qty_done 必须精确等于 qty, 违规行的ID随错误返回
pub fn validate_complete(mission: &MissionWithLines) -> Result<(), TransitionViolation> {
    ensure_transition(mission.mission.state, MissionState::Completed)?;

    let incomplete: Vec<String> = mission
        .lines
        .iter()
        .filter(|line| line.qty_done != line.qty)
        .map(|line| line.id.clone())
        .collect();

    if !incomplete.is_empty() {
        return Err(TransitionViolation::IncompleteLines(incomplete));
    }

    Ok(())
}

/// 取消前置校验 (特例, 不查转换表)
///
/// # 规则
/// 1. 取消原因去除空白后必须非空
/// 2. 终态 (COMPLETED/CANCELLED) 不可取消
pub fn validate_cancel(mission: &Mission, reason: &str) -> Result<(), TransitionViolation> {
    if reason.trim().is_empty() {
        return Err(TransitionViolation::CancelReasonRequired);
    }

    if mission.state.is_terminal() {
        return Err(TransitionViolation::CancelOnTerminalState);
    }

    Ok(())
}
