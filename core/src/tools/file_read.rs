use crate::traits::{Tool, ToolArgs};
use async_trait::async_trait;

pub struct FileReadTool {
    workspace: std::path::PathBuf,
}

impl FileReadTool {
    pub fn new(workspace: impl AsRef<std::path::Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the workspace; takes a path"
    }

    fn contract(&self) -> Option<Vec<String>> {
        Some(vec!["path".to_string()])
    }

    async fn invoke(&self, args: ToolArgs) -> anyhow::Result<String> {
        let path = args.require("path", 0)?;
        let full_path = self.workspace.join(&path);

        std::fs::read_to_string(&full_path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path, e))
    }
}
