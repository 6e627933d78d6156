use std::fmt::Write;
use uuid::Uuid;

/// One tool round-trip recorded in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExchange {
    pub tool: String,
    pub result: String,
}

/// Per-request execution record: the append-only transcript of tool
/// exchanges plus the iteration counter. Created at the start of one
/// `invoke` call, handed back in the outcome, never persisted.
#[derive(Debug, Clone)]
pub struct Trace {
    request_id: Uuid,
    exchanges: Vec<ToolExchange>,
    iterations: usize,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            exchanges: Vec::new(),
            iterations: 0,
        }
    }

    /// Correlation id for log lines belonging to this request.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub(crate) fn begin_iteration(&mut self) -> usize {
        self.iterations += 1;
        self.iterations
    }

    pub(crate) fn record(&mut self, tool: impl Into<String>, result: impl Into<String>) {
        self.exchanges.push(ToolExchange {
            tool: tool.into(),
            result: result.into(),
        });
    }

    pub fn exchanges(&self) -> &[ToolExchange] {
        &self.exchanges
    }

    /// Audit trail: tool names in call order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &str> {
        self.exchanges.iter().map(|e| e.tool.as_str())
    }

    /// Audit trail: results parallel to [`Trace::tool_calls`].
    pub fn tool_results(&self) -> impl Iterator<Item = &str> {
        self.exchanges.iter().map(|e| e.result.as_str())
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Scratchpad appended to the compiled prompt on every turn after the
    /// first, so the model sees what its tool calls produced.
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        for exchange in &self.exchanges {
            let _ = write!(
                out,
                "\n\n--- Previous Tool Call ---\nTool Used: {}\nResult: {}",
                exchange.tool, exchange.result
            );
        }
        if !self.exchanges.is_empty() {
            out.push_str("\n\nNow provide the final response to the user based on these results.");
        }
        out
    }
}

/// How an `invoke` call ended, other than by error. Budget exhaustion is a
/// normal terminal outcome, not a failure: it still carries every tool
/// call/result pair accumulated so far.
#[derive(Debug)]
pub enum Outcome {
    Answer {
        text: String,
        reasoning: Option<String>,
        trace: Trace,
    },
    BudgetExhausted {
        trace: Trace,
    },
}

impl Outcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Outcome::Answer { text, .. } => Some(text),
            Outcome::BudgetExhausted { .. } => None,
        }
    }

    pub fn trace(&self) -> &Trace {
        match self {
            Outcome::Answer { trace, .. } => trace,
            Outcome::BudgetExhausted { trace } => trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_is_append_only_and_parallel() {
        let mut trace = Trace::new();
        trace.record("calculator", "4");
        trace.record("word_count", "2");

        assert_eq!(trace.len(), 2);
        assert_eq!(
            trace.tool_calls().collect::<Vec<_>>(),
            vec!["calculator", "word_count"]
        );
        assert_eq!(trace.tool_results().collect::<Vec<_>>(), vec!["4", "2"]);
    }

    #[test]
    fn empty_trace_renders_nothing() {
        assert_eq!(Trace::new().render(), "");
    }

    #[test]
    fn render_includes_every_exchange() {
        let mut trace = Trace::new();
        trace.record("calculator", "359784");
        let rendered = trace.render();
        assert!(rendered.contains("Tool Used: calculator"));
        assert!(rendered.contains("Result: 359784"));
        assert!(rendered.contains("final response"));
    }
}
