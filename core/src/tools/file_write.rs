use crate::traits::{Tool, ToolArgs};
use async_trait::async_trait;

pub struct FileWriteTool {
    workspace: std::path::PathBuf,
}

impl FileWriteTool {
    pub fn new(workspace: impl AsRef<std::path::Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file in the workspace; takes a path and the content"
    }

    fn contract(&self) -> Option<Vec<String>> {
        Some(vec!["path".to_string(), "content".to_string()])
    }

    async fn invoke(&self, args: ToolArgs) -> anyhow::Result<String> {
        let path = args.require("path", 0)?;
        let content = args.require("content", 1)?;
        let full_path = self.workspace.join(&path);

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, &content)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path, e))?;

        Ok(format!("wrote {} bytes to {}", content.len(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_and_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let tool = FileWriteTool::new(tmp.path());
        let args = ToolArgs::Named(
            json!({"path": "notes/today.txt", "content": "done"})
                .as_object()
                .unwrap()
                .clone(),
        );
        let out = tool.invoke(args).await.unwrap();
        assert!(out.contains("4 bytes"));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("notes/today.txt")).unwrap(),
            "done"
        );
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let tool = FileWriteTool::new(tmp.path());
        let args = ToolArgs::Positional(vec!["only-a-path.txt".to_string()]);
        assert!(tool.invoke(args).await.is_err());
    }
}
