use serde_json::Value;

/// Presentation sink for loop transitions. The state machine itself never
/// prints; anything user-facing hangs off these callbacks. All methods
/// default to no-ops so implementors pick what they care about.
pub trait Observer: Send + Sync {
    fn turn_started(&self, _iteration: usize) {}

    fn tool_invoked(&self, _name: &str, _params: Option<&Value>) {}

    fn tool_completed(&self, _name: &str, _result: &str) {}

    fn tool_failed(&self, _name: &str, _error: &str) {}

    fn answer_ready(&self, _answer: &str) {}
}

pub struct NullObserver;

impl Observer for NullObserver {}
