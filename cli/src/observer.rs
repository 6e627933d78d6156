use console::style;
use ratchet_core::Observer;
use serde_json::Value;

/// Colored progress printing for verbose mode, wired into the loop's
/// transition points. The loop itself never prints.
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn turn_started(&self, iteration: usize) {
        println!("{}", style(format!("── turn {iteration} ──")).cyan().dim());
    }

    fn tool_invoked(&self, name: &str, params: Option<&Value>) {
        println!("{} {}", style("🔧 Tool:").yellow(), style(name).bold());
        if let Some(params) = params {
            println!("{} {}", style("📝 Params:").yellow(), params);
        }
    }

    fn tool_completed(&self, _name: &str, result: &str) {
        println!("{} {}\n", style("📤 Result:").green(), result);
    }

    fn tool_failed(&self, name: &str, error: &str) {
        println!("{} {} {}\n", style("✗").red(), style(name).bold(), error);
    }

    fn answer_ready(&self, answer: &str) {
        println!("\n{}", style("Final Response:").green().bold());
        println!("{} {}\n", style("▸").green(), answer);
    }
}
