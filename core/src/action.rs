use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Action code meaning "nothing to do". Never surfaced as an advisory.
pub const ACTION_NONE: &str = "NONE";
pub const ACTION_NOTIFY: &str = "NOTIFY";
pub const ACTION_STOP: &str = "STOP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// Operator advisory derived from a backend action code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionMessage {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Map an action code to an advisory.
///
/// Unrecognized codes become a generic warning carrying the raw code as
/// description; `None` and the empty code yield no advisory.
pub fn classify(action: Option<&str>) -> Option<ActionMessage> {
    let action = action.filter(|code| !code.is_empty())?;
    let message = match action {
        ACTION_NOTIFY => ActionMessage {
            title: "Notify Supervisor".to_string(),
            description: "This metric requires supervisor review and notification.".to_string(),
            severity: Severity::Warning,
        },
        ACTION_STOP => ActionMessage {
            title: "Stop Agent".to_string(),
            description: "This metric failure requires the agent to be stopped immediately."
                .to_string(),
            severity: Severity::Critical,
        },
        other => ActionMessage {
            title: "Action Required".to_string(),
            description: other.to_string(),
            severity: Severity::Warning,
        },
    };
    Some(message)
}
