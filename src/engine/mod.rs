// ==========================================
// 仓储执行系统 - 规则引擎层
// ==========================================
// 职责: 任务状态机与移动校验的纯规则评估
// 红线: Engine 不拼 SQL, 无副作用; 所有失败必须携带可读 reason
// ==========================================

pub mod movement_check;
pub mod transition;

// 重导出核心引擎
pub use movement_check::{validate_movement, MovementCheckContext, MovementRuleViolation};
pub use transition::{
    allowed_transitions, ensure_transition, validate_assign, validate_cancel, validate_complete,
    validate_start, TransitionViolation,
};
