//! System tools: process launch and GPU telemetry

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::CommandSpec;
use crate::logging::Logger;
use crate::types::ToolArguments;
use super::registry::ToolHandler;

pub const OPEN_TASK_MANAGER: &str = "OpenTaskManager";
pub const GET_GPU_MEMORY_UTILIZATION: &str = "GetGpuMemoryUtilization";

const NO_GPU_INFO: &str =
    "No GPU information found. Ensure NVIDIA drivers and nvidia-smi are installed.";

/// Launches the task manager and returns without waiting for it
pub struct OpenTaskManagerTool {
    command: CommandSpec,
    logger: Arc<dyn Logger>,
}

impl OpenTaskManagerTool {
    pub fn new(command: CommandSpec, logger: Arc<dyn Logger>) -> Self {
        Self { command, logger }
    }
}

#[async_trait]
impl ToolHandler for OpenTaskManagerTool {
    async fn call(&self, _args: &ToolArguments) -> String {
        self.logger
            .info(&format!("[Tools] Launching task manager: {}", self.command));

        let spawned = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_child) => "Task Manager has been opened successfully.".to_string(),
            Err(e) => format!("Failed to open Task Manager: {}", e),
        }
    }
}

/// Queries per-GPU memory through nvidia-smi
pub struct GpuMemoryTool {
    command: CommandSpec,
    logger: Arc<dyn Logger>,
}

impl GpuMemoryTool {
    pub fn new(command: CommandSpec, logger: Arc<dyn Logger>) -> Self {
        Self { command, logger }
    }
}

#[async_trait]
impl ToolHandler for GpuMemoryTool {
    async fn call(&self, _args: &ToolArguments) -> String {
        self.logger
            .debug(&format!("[Tools] Querying GPU memory: {}", self.command));

        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => format_gpu_memory(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => format!("Failed to get GPU memory utilization: {}", e),
        }
    }
}

/// Render `total, used, free` CSV rows as one line per GPU
///
/// Empty lines are skipped. Rows without exactly three fields produce no
/// output but still consume a GPU index.
pub fn format_gpu_memory(output: &str) -> String {
    if output.trim().is_empty() {
        return NO_GPU_INFO.to_string();
    }

    let mut result = String::new();
    let lines = output.split(['\r', '\n']).filter(|l| !l.is_empty());
    for (index, line) in lines.enumerate() {
        let parts: Vec<&str> = line.split(',').collect();
        if let [total, used, free] = parts.as_slice() {
            result.push_str(&format!(
                "GPU {}: Total: {} MiB, Used: {} MiB, Free: {} MiB\n",
                index,
                total.trim(),
                used.trim(),
                free.trim()
            ));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_format_two_gpus() {
        let output = "24576, 1024, 23552\r\n8192, 512, 7680\r\n";
        assert_eq!(
            format_gpu_memory(output),
            "GPU 0: Total: 24576 MiB, Used: 1024 MiB, Free: 23552 MiB\n\
             GPU 1: Total: 8192 MiB, Used: 512 MiB, Free: 7680 MiB\n"
        );
    }

    #[test]
    fn test_malformed_row_consumes_index() {
        let output = "garbage\n8192, 512, 7680\n";
        assert_eq!(
            format_gpu_memory(output),
            "GPU 1: Total: 8192 MiB, Used: 512 MiB, Free: 7680 MiB\n"
        );
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(format_gpu_memory("  \n"), NO_GPU_INFO);
    }

    #[tokio::test]
    async fn test_missing_binary_reports_failure() {
        let tool = GpuMemoryTool::new(
            CommandSpec::new("localrelay-no-such-binary", &[]),
            Arc::new(NoOpLogger),
        );
        let text = tool.call(&ToolArguments::default()).await;
        assert!(text.starts_with("Failed to get GPU memory utilization: "));

        let tool = OpenTaskManagerTool::new(
            CommandSpec::new("localrelay-no-such-binary", &[]),
            Arc::new(NoOpLogger),
        );
        let text = tool.call(&ToolArguments::default()).await;
        assert!(text.starts_with("Failed to open Task Manager: "));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gpu_query_runs_configured_command() {
        let tool = GpuMemoryTool::new(
            CommandSpec::new("echo", &["16384, 100, 16284"]),
            Arc::new(NoOpLogger),
        );
        assert_eq!(
            tool.call(&ToolArguments::default()).await,
            "GPU 0: Total: 16384 MiB, Used: 100 MiB, Free: 16284 MiB\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_task_manager_spawn_succeeds() {
        let tool = OpenTaskManagerTool::new(CommandSpec::new("true", &[]), Arc::new(NoOpLogger));
        assert_eq!(
            tool.call(&ToolArguments::default()).await,
            "Task Manager has been opened successfully."
        );
    }
}
