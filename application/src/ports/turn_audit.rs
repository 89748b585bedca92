//! Turn audit port.
//!
//! One record per completed turn, for offline inspection of routing and
//! collaboration behavior. Audit failures never fail a turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tutormesh_domain::{CollaborativeInfo, InteractionMode, RouteDecision};

/// Everything worth remembering about one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub session_id: String,
    pub mode: InteractionMode,
    pub agent_ids: Vec<String>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborative: Option<CollaborativeInfo>,
}

/// Sink for turn records
pub trait TurnAuditLogger: Send + Sync {
    fn record(&self, record: &TurnRecord);
}

/// No-op audit logger
pub struct NoAudit;

impl TurnAuditLogger for NoAudit {
    fn record(&self, _record: &TurnRecord) {}
}
