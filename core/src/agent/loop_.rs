use crate::agent::compiler::{self, CompiledPrompt, USER_INPUT_PLACEHOLDER};
use crate::agent::registry::ToolRegistry;
use crate::agent::state::{Outcome, Trace};
use crate::binder;
use crate::error::{AgentError, TimedOutPhase};
use crate::interpret;
use crate::observer::{NullObserver, Observer};
use crate::profile::AgentConfig;
use crate::traits::Provider;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(300);

/// Drives one request to completion: compile the prompt, then repeatedly
/// call the model, interpret its reply, and either execute a tool and
/// extend the transcript, stop with a final answer, or exhaust the turn
/// budget.
///
/// Strictly sequential: one `invoke` call owns its trace exclusively and
/// runs to completion before returning. The registry and profile must not
/// be mutated while a request is in flight.
pub struct AgentLoop {
    config: AgentConfig,
    provider: Option<Arc<dyn Provider>>,
    tools: ToolRegistry,
    observer: Arc<dyn Observer>,
    turn_timeout: Duration,
    compiled: Mutex<Option<CompiledPrompt>>,
}

impl AgentLoop {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            provider: None,
            tools: ToolRegistry::new(),
            observer: Arc::new(NullObserver),
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            compiled: Mutex::new(None),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Deadline applied independently to every model call and every tool
    /// invocation. A hung collaborator surfaces as `TimedOut` instead of
    /// hanging the loop forever.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Everything that must hold before the first network call.
    fn validate(&self) -> Result<Arc<dyn Provider>, AgentError> {
        let provider = self.provider.clone().ok_or_else(|| {
            AgentError::Configuration("no model provider bound; call with_provider first".into())
        })?;
        if self.tools.is_empty() {
            return Err(AgentError::Configuration(
                "no tools registered; register at least one tool".into(),
            ));
        }
        if !self.config.prompt_template.contains(USER_INPUT_PLACEHOLDER) {
            return Err(AgentError::Configuration(format!(
                "prompt template of '{}' has no {} placeholder",
                self.config.name, USER_INPUT_PLACEHOLDER
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(AgentError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        self.config
            .response_schema
            .verify()
            .map_err(AgentError::Configuration)?;
        Ok(provider)
    }

    /// Lazily recompiled on first use after any registry mutation; reused
    /// across turns and across requests otherwise.
    fn compiled_prompt(&self) -> String {
        let revision = self.tools.revision();
        let mut cache = self.compiled.lock().unwrap();
        match cache.as_ref() {
            Some(compiled) if compiled.revision == revision => compiled.text.clone(),
            _ => {
                let text = compiler::compile(&self.config, &self.tools.descriptions());
                debug!(revision, "compiled prompt template");
                *cache = Some(CompiledPrompt {
                    revision,
                    text: text.clone(),
                });
                text
            }
        }
    }

    pub async fn invoke(&self, request: &str) -> Result<Outcome, AgentError> {
        let provider = self.validate()?;

        let prompt = self.compiled_prompt().replace(USER_INPUT_PLACEHOLDER, request);
        let schema = &self.config.response_schema;
        let mut trace = Trace::new();

        info!(
            request_id = %trace.request_id(),
            agent = %self.config.name,
            "agent loop started"
        );

        loop {
            if trace.iterations() == self.config.max_iterations {
                warn!(
                    request_id = %trace.request_id(),
                    max_iterations = self.config.max_iterations,
                    "turn budget exhausted"
                );
                return Ok(Outcome::BudgetExhausted { trace });
            }
            let iteration = trace.begin_iteration();
            self.observer.turn_started(iteration);

            let full_prompt = if trace.is_empty() {
                prompt.clone()
            } else {
                format!("{prompt}{}", trace.render())
            };

            debug!(iteration, prompt_chars = full_prompt.len(), "calling model");
            let reply =
                match tokio::time::timeout(self.turn_timeout, provider.generate(&full_prompt))
                    .await
                {
                    Err(_) => {
                        return Err(AgentError::TimedOut {
                            phase: TimedOutPhase::Model,
                            timeout: self.turn_timeout,
                        });
                    }
                    Ok(Err(e)) => return Err(AgentError::ModelCall(e.to_string())),
                    Ok(Ok(text)) if text.trim().is_empty() => {
                        return Err(AgentError::ModelCall(
                            "provider returned an empty reply".into(),
                        ));
                    }
                    Ok(Ok(text)) => text,
                };

            let turn = interpret::interpret(&reply, schema)?;

            // An answer always ends the loop, even when a tool is named on
            // the same turn.
            if let Some(answer) = turn.answer {
                info!(request_id = %trace.request_id(), iteration, "final answer produced");
                self.observer.answer_ready(&answer);
                return Ok(Outcome::Answer {
                    text: answer,
                    reasoning: turn.reasoning,
                    trace,
                });
            }

            let Some(tool_name) = turn.tool else {
                return Err(AgentError::UnresolvableTurn { tool: None });
            };
            let Some(tool) = self.tools.resolve(&tool_name) else {
                return Err(AgentError::UnresolvableTurn {
                    tool: Some(tool_name),
                });
            };

            self.observer.tool_invoked(&tool_name, turn.parameters.as_ref());
            debug!(iteration, tool = %tool_name, "executing tool");

            let bound = tokio::time::timeout(
                self.turn_timeout,
                binder::bind_and_call(&tool, turn.parameters.as_ref(), schema.sentinel()),
            )
            .await;

            let entry = match bound {
                Err(_) => {
                    return Err(AgentError::TimedOut {
                        phase: TimedOutPhase::Tool,
                        timeout: self.turn_timeout,
                    });
                }
                Ok(Ok(result)) => {
                    self.observer.tool_completed(&tool_name, &result);
                    result
                }
                // Recoverable: the model sees the failure on its next turn
                // and may retry or answer around it.
                Ok(Err(e)) => {
                    warn!(tool = %tool_name, error = %e, "tool failed");
                    self.observer.tool_failed(&tool_name, &e.message);
                    format!("Error executing tool '{}': {}", e.tool, e.message)
                }
            };
            trace.record(&tool_name, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::schema::{ResponseSchema, Role};
    use crate::traits::{FnTool, Tool, ToolArgs};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new<const N: usize>(replies: [String; N]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }
    }

    struct RepeatingProvider {
        reply: String,
    }

    #[async_trait]
    impl Provider for RepeatingProvider {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct SleepyProvider;

    #[async_trait]
    impl Provider for SleepyProvider {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    struct SleepyTool;

    #[async_trait]
    impl Tool for SleepyTool {
        fn name(&self) -> &str {
            "molasses"
        }

        fn description(&self) -> &str {
            "Takes forever"
        }

        async fn invoke(&self, _args: ToolArgs) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn tool_reply(tool: &str, params: &str) -> String {
        format!(
            "```json\n{{\"Tool call\": \"{tool}\", \"Tool Parameters\": {params}, \"Final Response\": \"None\"}}\n```"
        )
    }

    fn answer_reply(answer: &str) -> String {
        format!(
            "```json\n{{\"Tool call\": \"None\", \"Tool Parameters\": \"None\", \"Final Response\": \"{answer}\"}}\n```"
        )
    }

    fn agent(provider: Arc<dyn Provider>) -> AgentLoop {
        AgentLoop::new(AgentConfig::builtin("tool-call").unwrap()).with_provider(provider)
    }

    fn flagging_tool(name: &str, called: Arc<AtomicBool>, result: &str) -> Arc<dyn Tool> {
        let result = result.to_string();
        Arc::new(FnTool::new(name, "test tool", move |_args: ToolArgs| {
            called.store(true, Ordering::SeqCst);
            Ok(result.clone())
        }))
    }

    #[tokio::test]
    async fn scenario_tool_then_answer() {
        let provider = ScriptedProvider::new([
            tool_reply("calculator", "{\"expression\": \"456*789\"}"),
            answer_reply("359784"),
        ]);
        let agent = agent(provider.clone());
        agent
            .tools()
            .register(Arc::new(
                FnTool::new("calculator", "Evaluates expressions", |args: ToolArgs| {
                    assert_eq!(args.named("expression").as_deref(), Some("456*789"));
                    Ok("359784".to_string())
                })
                .with_contract(["expression"]),
            ))
            .unwrap();

        let outcome = agent.invoke("what is 456*789").await.unwrap();
        let Outcome::Answer { text, trace, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, "359784");
        assert_eq!(trace.iterations(), 2);
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.tool_calls().collect::<Vec<_>>(), vec!["calculator"]);
        assert_eq!(trace.tool_results().collect::<Vec<_>>(), vec!["359784"]);
    }

    #[tokio::test]
    async fn scenario_immediate_answer() {
        let provider = ScriptedProvider::new([answer_reply("hello there")]);
        let agent = agent(provider);
        let called = Arc::new(AtomicBool::new(false));
        agent
            .tools()
            .register(flagging_tool("calculator", called.clone(), "4"))
            .unwrap();

        let outcome = agent.invoke("hi").await.unwrap();
        let Outcome::Answer { text, trace, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, "hello there");
        assert_eq!(trace.iterations(), 1);
        assert!(trace.is_empty());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn scenario_unknown_tool_aborts_without_calling_anything() {
        let provider = ScriptedProvider::new([tool_reply("magic", "\"None\"")]);
        let agent = agent(provider);
        let called = Arc::new(AtomicBool::new(false));
        agent
            .tools()
            .register(flagging_tool("calculator", called.clone(), "4"))
            .unwrap();

        let err = agent.invoke("do magic").await.unwrap_err();
        match err {
            AgentError::UnresolvableTurn { tool } => assert_eq!(tool.as_deref(), Some("magic")),
            other => panic!("expected UnresolvableTurn, got {other:?}"),
        }
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn scenario_unstructured_reply_aborts() {
        let provider = ScriptedProvider::new(["I refuse to follow formats.".to_string()]);
        let agent = agent(provider);
        let called = Arc::new(AtomicBool::new(false));
        agent
            .tools()
            .register(flagging_tool("calculator", called.clone(), "4"))
            .unwrap();

        let err = agent.invoke("anything").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Parse(ParseError::NoStructuredBlock)
        ));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn budget_exhaustion_reports_every_exchange() {
        let max = 3;
        let provider = Arc::new(RepeatingProvider {
            reply: tool_reply("calculator", "{\"expression\": \"1+1\"}"),
        });
        let agent = AgentLoop::new(
            AgentConfig::builtin("tool-call")
                .unwrap()
                .with_max_iterations(max),
        )
        .with_provider(provider);
        agent
            .tools()
            .register(Arc::new(FnTool::new("calculator", "d", |_| {
                Ok("2".to_string())
            })))
            .unwrap();

        let outcome = agent.invoke("loop forever").await.unwrap();
        let Outcome::BudgetExhausted { trace } = outcome else {
            panic!("expected budget exhaustion");
        };
        assert_eq!(trace.iterations(), max);
        assert_eq!(trace.len(), max);
        assert!(trace.tool_calls().all(|name| name == "calculator"));
    }

    #[tokio::test]
    async fn answer_wins_when_both_roles_are_populated() {
        let reply = "```json\n{\"Tool call\": \"calculator\", \"Tool Parameters\": \"None\", \"Final Response\": \"42\"}\n```";
        let provider = ScriptedProvider::new([reply.to_string()]);
        let agent = agent(provider);
        let called = Arc::new(AtomicBool::new(false));
        agent
            .tools()
            .register(flagging_tool("calculator", called.clone(), "4"))
            .unwrap();

        let outcome = agent.invoke("both").await.unwrap();
        assert_eq!(outcome.answer(), Some("42"));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn tool_failure_is_absorbed_into_the_transcript() {
        let provider = ScriptedProvider::new([
            tool_reply("boom", "\"None\""),
            answer_reply("recovered"),
        ]);
        let agent = agent(provider.clone());
        agent
            .tools()
            .register(Arc::new(FnTool::new("boom", "Always fails", |_| {
                anyhow::bail!("exploded")
            })))
            .unwrap();

        let outcome = agent.invoke("try it").await.unwrap();
        let Outcome::Answer { text, trace, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, "recovered");
        assert_eq!(trace.len(), 1);
        let result = trace.tool_results().next().unwrap().to_string();
        assert!(result.contains("Error executing tool 'boom'"));
        assert!(result.contains("exploded"));

        // The failure text was replayed to the model on the second turn.
        let prompts = provider.prompts();
        assert!(prompts[1].contains("Error executing tool 'boom'"));
    }

    #[tokio::test]
    async fn transcript_is_replayed_into_later_prompts() {
        let provider = ScriptedProvider::new([
            tool_reply("calculator", "{\"expression\": \"456*789\"}"),
            answer_reply("359784"),
        ]);
        let agent = agent(provider.clone());
        agent
            .tools()
            .register(Arc::new(FnTool::new("calculator", "d", |_| {
                Ok("359784".to_string())
            })))
            .unwrap();
        agent.invoke("what is 456*789").await.unwrap();

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("--- Previous Tool Call ---"));
        assert!(prompts[0].contains("what is 456*789"));
        assert!(prompts[1].contains("Tool Used: calculator"));
        assert!(prompts[1].contains("Result: 359784"));
    }

    #[tokio::test]
    async fn parse_failure_after_a_tool_turn_still_aborts() {
        let provider = ScriptedProvider::new([
            tool_reply("calculator", "\"None\""),
            "gibberish".to_string(),
        ]);
        let agent = agent(provider);
        agent
            .tools()
            .register(Arc::new(FnTool::new("calculator", "d", |_| {
                Ok("4".to_string())
            })))
            .unwrap();

        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Parse(ParseError::NoStructuredBlock)
        ));
    }

    #[tokio::test]
    async fn missing_provider_is_a_configuration_error() {
        let agent = AgentLoop::new(AgentConfig::builtin("tool-call").unwrap());
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(msg) if msg.contains("provider")));
    }

    #[tokio::test]
    async fn missing_tools_fail_before_any_model_call() {
        let provider = ScriptedProvider::new([]);
        let agent = agent(provider.clone());
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(msg) if msg.contains("tool")));
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn template_without_input_placeholder_is_rejected() {
        let mut profile = AgentConfig::builtin("tool-call").unwrap();
        profile.prompt_template = "Tools: {tool_list}".to_string();
        let agent = AgentLoop::new(profile).with_provider(ScriptedProvider::new([]));
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(msg) if msg.contains("{user_input}")));
    }

    #[tokio::test]
    async fn schema_without_answer_role_is_rejected() {
        let schema = ResponseSchema::new(["tool"]).with_role(Role::Tool, "tool");
        let profile = AgentConfig::new("broken", "{tool_list} {user_input}", schema);
        let agent = AgentLoop::new(profile).with_provider(ScriptedProvider::new([]));
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[tokio::test]
    async fn empty_model_reply_is_a_model_error() {
        let provider = ScriptedProvider::new(["   ".to_string()]);
        let agent = agent(provider);
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::ModelCall(_)));
    }

    #[tokio::test]
    async fn provider_error_is_reported_verbatim() {
        let provider = ScriptedProvider::new([]);
        let agent = agent(provider);
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(err, AgentError::ModelCall(msg) if msg.contains("script exhausted")));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_model_call_times_out() {
        let agent = agent(Arc::new(SleepyProvider))
            .with_turn_timeout(Duration::from_secs(5));
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::TimedOut {
                phase: TimedOutPhase::Model,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_tool_call_times_out() {
        let provider = ScriptedProvider::new([tool_reply("molasses", "\"None\"")]);
        let agent = agent(provider).with_turn_timeout(Duration::from_secs(5));
        agent.tools().register(Arc::new(SleepyTool)).unwrap();
        let err = agent.invoke("x").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::TimedOut {
                phase: TimedOutPhase::Tool,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn compiled_prompt_is_cached_until_the_registry_changes() {
        let agent = agent(ScriptedProvider::new([]));
        agent
            .tools()
            .register(Arc::new(FnTool::new("calculator", "d", |_| {
                Ok("4".to_string())
            })))
            .unwrap();

        let first = agent.compiled_prompt();
        let second = agent.compiled_prompt();
        assert_eq!(first, second);
        assert!(first.contains("- calculator: d"));

        agent
            .tools()
            .register(Arc::new(FnTool::new("word_count", "Counts words", |_| {
                Ok("0".to_string())
            })))
            .unwrap();
        let third = agent.compiled_prompt();
        assert_ne!(first, third);
        assert!(third.contains("- word_count: Counts words"));
    }

    #[tokio::test]
    async fn reasoning_surfaces_as_a_side_channel() {
        let reply = concat!(
            "```json\n",
            "{\"Thought\": \"simple greeting\", \"Action\": \"None\", ",
            "\"Action Input\": \"None\", \"Final Answer\": \"hi\"}\n",
            "```"
        );
        let agent = AgentLoop::new(AgentConfig::builtin("react").unwrap())
            .with_provider(ScriptedProvider::new([reply.to_string()]));
        agent
            .tools()
            .register(Arc::new(FnTool::new("t", "d", |_| Ok("ok".to_string()))))
            .unwrap();

        let outcome = agent.invoke("hello").await.unwrap();
        let Outcome::Answer { text, reasoning, .. } = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(text, "hi");
        assert_eq!(reasoning.as_deref(), Some("simple greeting"));
    }
}
