// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{NaiveDateTime, Utc};
use warehouse_wes::domain::mission::{Mission, MissionLine, MissionLinePayload};
use warehouse_wes::domain::types::{ExecutorType, MissionState, MissionType};
use warehouse_wes::domain::Executor;

// ==========================================
// Mission 构建器
// ==========================================

pub struct MissionBuilder {
    id: String,
    mission_no: String,
    mission_type: MissionType,
    state: MissionState,
    priority: i32,
    created_by_operator_id: String,
    assigned_executor_id: Option<String>,
    started_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
    cancel_reason: Option<String>,
}

impl MissionBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            mission_no: format!("MSN-{}", id),
            mission_type: MissionType::MoveItem,
            state: MissionState::Draft,
            priority: 0,
            created_by_operator_id: "OPR_T01".to_string(),
            assigned_executor_id: None,
            started_at: None,
            completed_at: None,
            cancel_reason: None,
        }
    }

    pub fn mission_no(mut self, mission_no: &str) -> Self {
        self.mission_no = mission_no.to_string();
        self
    }

    pub fn mission_type(mut self, mission_type: MissionType) -> Self {
        self.mission_type = mission_type;
        self
    }

    pub fn state(mut self, state: MissionState) -> Self {
        self.state = state;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn created_by(mut self, operator_id: &str) -> Self {
        self.created_by_operator_id = operator_id.to_string();
        self
    }

    pub fn assigned_to(mut self, executor_id: &str) -> Self {
        self.assigned_executor_id = Some(executor_id.to_string());
        if self.state == MissionState::Draft {
            self.state = MissionState::Assigned;
        }
        self
    }

    pub fn in_progress(mut self, executor_id: &str) -> Self {
        self.assigned_executor_id = Some(executor_id.to_string());
        self.state = MissionState::InProgress;
        self.started_at = Some(Utc::now().naive_utc());
        self
    }

    pub fn build(self) -> Mission {
        Mission {
            id: self.id,
            mission_no: self.mission_no,
            mission_type: self.mission_type,
            state: self.state,
            priority: self.priority,
            created_by_operator_id: self.created_by_operator_id,
            assigned_executor_id: self.assigned_executor_id,
            created_at: Utc::now().naive_utc(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            cancel_reason: self.cancel_reason,
        }
    }
}

// ==========================================
// MissionLine 构建器
// ==========================================

pub struct MissionLineBuilder {
    id: String,
    mission_id: String,
    from_location_id: String,
    to_location_id: String,
    payload: MissionLinePayload,
    qty: f64,
    qty_done: f64,
}

impl MissionLineBuilder {
    pub fn new(id: &str, mission_id: &str) -> Self {
        Self {
            id: id.to_string(),
            mission_id: mission_id.to_string(),
            from_location_id: "LOC_T01".to_string(),
            to_location_id: "LOC_T02".to_string(),
            payload: MissionLinePayload::MoveItem {
                item_id: "ITM_T01".to_string(),
                hu_id: None,
            },
            qty: 10.0,
            qty_done: 0.0,
        }
    }

    pub fn route(mut self, from_location_id: &str, to_location_id: &str) -> Self {
        self.from_location_id = from_location_id.to_string();
        self.to_location_id = to_location_id.to_string();
        self
    }

    pub fn item(mut self, item_id: &str) -> Self {
        self.payload = MissionLinePayload::MoveItem {
            item_id: item_id.to_string(),
            hu_id: None,
        };
        self
    }

    pub fn item_on_hu(mut self, item_id: &str, hu_id: &str) -> Self {
        self.payload = MissionLinePayload::MoveItem {
            item_id: item_id.to_string(),
            hu_id: Some(hu_id.to_string()),
        };
        self
    }

    pub fn handling_unit(mut self, hu_id: &str) -> Self {
        self.payload = MissionLinePayload::MoveHandlingUnit {
            hu_id: hu_id.to_string(),
        };
        self
    }

    pub fn qty(mut self, qty: f64) -> Self {
        self.qty = qty;
        self
    }

    pub fn qty_done(mut self, qty_done: f64) -> Self {
        self.qty_done = qty_done;
        self
    }

    pub fn build(self) -> MissionLine {
        MissionLine {
            id: self.id,
            mission_id: self.mission_id,
            from_location_id: self.from_location_id,
            to_location_id: self.to_location_id,
            payload: self.payload,
            qty: self.qty,
            qty_done: self.qty_done,
        }
    }
}

// ==========================================
// Executor 构建器
// ==========================================

pub struct ExecutorBuilder {
    id: String,
    code: String,
    executor_type: ExecutorType,
    max_payload_kg: f64,
    active: bool,
    last_seen_at: Option<NaiveDateTime>,
}

impl ExecutorBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            code: format!("EX-{}", id),
            executor_type: ExecutorType::Human,
            max_payload_kg: 80.0,
            active: true,
            last_seen_at: None,
        }
    }

    pub fn agv(mut self) -> Self {
        self.executor_type = ExecutorType::Agv;
        self.max_payload_kg = 1200.0;
        self
    }

    pub fn max_payload(mut self, kg: f64) -> Self {
        self.max_payload_kg = kg;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn last_seen(mut self, at: NaiveDateTime) -> Self {
        self.last_seen_at = Some(at);
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            id: self.id,
            code: self.code.clone(),
            name: format!("执行者 {}", self.code),
            executor_type: self.executor_type,
            max_payload_kg: self.max_payload_kg,
            active: self.active,
            last_seen_at: self.last_seen_at,
            created_at: Utc::now().naive_utc(),
        }
    }
}
