use crate::traits::Tool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Insertion-ordered tool store, owned by one agent. The registration
/// order is exposed verbatim in the compiled prompt, so it is part of the
/// observable contract, not an implementation detail.
///
/// Mutating the registry while an `invoke` call is in flight is undefined
/// behavior at the contract level: register tools up front.
pub struct ToolRegistry {
    tools: Mutex<Vec<Arc<dyn Tool>>>,
    revision: AtomicU64,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Mutex::new(Vec::new()),
            revision: AtomicU64::new(0),
        }
    }

    /// Duplicate names are rejected; re-registering under the same name
    /// requires an explicit `unregister` first.
    pub fn register(&self, tool: Arc<dyn Tool>) -> anyhow::Result<()> {
        let mut tools = self.tools.lock().unwrap();
        if tools.iter().any(|t| t.name() == tool.name()) {
            anyhow::bail!(
                "tool '{}' is already registered; unregister it first",
                tool.name()
            );
        }
        tools.push(tool);
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Returns whether a tool with that name was present.
    pub fn unregister(&self, name: &str) -> bool {
        let mut tools = self.tools.lock().unwrap();
        let before = tools.len();
        tools.retain(|t| t.name() != name);
        let removed = tools.len() != before;
        if removed {
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.lock().unwrap();
        tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Tool names in registration order.
    pub fn list(&self) -> Vec<String> {
        let tools = self.tools.lock().unwrap();
        tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// (name, description) pairs in registration order, for the prompt
    /// compiler.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        let tools = self.tools.lock().unwrap();
        tools
            .iter()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.lock().unwrap().is_empty()
    }

    /// Bumped on every mutation; the compiled-prompt cache keys off this.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnTool;

    fn tool(name: &str, description: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(name, description, |_| Ok("ok".to_string())))
    }

    #[test]
    fn register_then_resolve_round_trips() {
        let registry = ToolRegistry::new();
        let calculator = tool("calculator", "Evaluates expressions");
        registry.register(calculator.clone()).unwrap();

        let resolved = registry.resolve("calculator").unwrap();
        assert_eq!(resolved.description(), "Evaluates expressions");
        assert!(Arc::ptr_eq(&resolved, &calculator));
    }

    #[test]
    fn unregister_then_resolve_is_not_found() {
        let registry = ToolRegistry::new();
        registry.register(tool("calculator", "d")).unwrap();
        assert!(registry.unregister("calculator"));
        assert!(registry.resolve("calculator").is_none());
        assert!(!registry.unregister("calculator"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ToolRegistry::new();
        registry.register(tool("calculator", "first")).unwrap();
        let err = registry.register(tool("calculator", "second")).unwrap_err();
        assert!(format!("{err}").contains("already registered"));
        // The original registration is untouched.
        assert_eq!(registry.resolve("calculator").unwrap().description(), "first");
    }

    #[test]
    fn list_preserves_registration_order() {
        let registry = ToolRegistry::new();
        registry.register(tool("zebra", "d")).unwrap();
        registry.register(tool("apple", "d")).unwrap();
        registry.register(tool("mango", "d")).unwrap();
        assert_eq!(registry.list(), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn every_mutation_bumps_the_revision() {
        let registry = ToolRegistry::new();
        let r0 = registry.revision();
        registry.register(tool("a", "d")).unwrap();
        let r1 = registry.revision();
        assert!(r1 > r0);
        registry.unregister("a");
        assert!(registry.revision() > r1);
    }
}
