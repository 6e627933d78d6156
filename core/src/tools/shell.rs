use crate::traits::{Tool, ToolArgs};
use async_trait::async_trait;
use std::process::Command;

pub struct ShellTool {
    workspace: std::path::PathBuf,
}

impl ShellTool {
    pub fn new(workspace: impl AsRef<std::path::Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory"
    }

    fn contract(&self) -> Option<Vec<String>> {
        Some(vec!["command".to_string()])
    }

    async fn invoke(&self, args: ToolArgs) -> anyhow::Result<String> {
        let command = args.require("command", 0)?;

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&self.workspace)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(if stdout.is_empty() { stderr } else { stdout })
        } else if stderr.is_empty() {
            anyhow::bail!("command failed with status: {}", output.status)
        } else {
            anyhow::bail!(stderr)
        }
    }
}
