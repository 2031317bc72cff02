//! Snippet execution.
//!
//! Every invocation runs in a fresh JavaScript runtime process. The host
//! sends the job (stripped code, mocks, execution limit) on stdin; the
//! runner answers with JSON lines on stdout:
//!
//! - `compiled` once the wrapped snippet compiled,
//! - then one of `done` (with the captured values), `error` or `timeout`.
//!
//! Failures before compilation are reported as `syntax` or `mockError`.
//! The host waits at most the parse timeout for `compiled` and at most the
//! execution timeout for the final event, killing the process on expiry.
//! Captured values live in the child, so concurrent runs cannot see each
//! other's output.

use crate::error::{Result, SandboxError};
use crate::mocks::{load_mocks, MockBinding};
use crate::outcome::SandboxOutcome;
use crate::strip::strip_types;
use fdoc_core::{ConfigSource, SandboxSettings, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const RUNNER: &str = include_str!("runner.js");

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Job<'a> {
    code: &'a str,
    mocks: &'a [MockBinding],
    execution_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum RunnerEvent {
    Compiled,
    Syntax { message: String },
    MockError { name: String, message: String },
    Done { values: Vec<Value> },
    Error { message: String },
    Timeout,
}

/// Runs snippets for one project.
pub struct Sandbox {
    root: PathBuf,
    storage: Arc<dyn Storage>,
    config: Arc<dyn ConfigSource>,
}

impl Sandbox {
    pub fn new(root: impl Into<PathBuf>, storage: Arc<dyn Storage>, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            root: root.into(),
            storage,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs a snippet and returns the values it captured, or nothing when
    /// it failed to parse, threw or timed out.
    pub async fn run_code(&self, code: &str) -> Result<Vec<Value>> {
        Ok(self.execute(code).await?.into_values())
    }

    /// Runs a snippet and reports how it ended.
    ///
    /// Errors are reserved for problems outside the snippet: unloadable
    /// mocks, a missing runtime, broken configuration.
    pub async fn execute(&self, code: &str) -> Result<SandboxOutcome> {
        let settings = self.config.load_sandbox_settings()?;
        let mocks = load_mocks(self.storage.as_ref(), self.config.as_ref(), &self.root).await?;

        let script = match strip_types(code) {
            Ok(script) => script,
            Err(e) => {
                warn!("Snippet rejected: {}", e);
                return Ok(SandboxOutcome::ParseError(e.to_string()));
            }
        };

        let job = Job {
            code: &script,
            mocks: &mocks,
            execution_timeout_ms: settings.execution_timeout_ms,
        };
        let payload = serde_json::to_vec(&job).map_err(io::Error::other)?;

        run_job(&settings, &payload).await
    }
}

async fn run_job(settings: &SandboxSettings, payload: &[u8]) -> Result<SandboxOutcome> {
    let mut command = Command::new(&settings.runtime);
    command
        .arg(format!("--max-old-space-size={}", settings.max_memory_mb))
        .arg("-e")
        .arg(RUNNER)
        .env_clear()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = std::env::var_os("PATH") {
        command.env("PATH", path);
    }

    let mut child = command
        .spawn()
        .map_err(|source| SandboxError::RuntimeUnavailable {
            runtime: settings.runtime.clone(),
            source,
        })?;

    let (Some(mut stdin), Some(stdout), Some(stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        return Err(SandboxError::Io(io::Error::other("runtime pipes unavailable")));
    };

    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!("{}", line);
        }
    });

    stdin.write_all(payload).await?;
    drop(stdin);

    let mut events = BufReader::new(stdout).lines();

    let parse_limit = Duration::from_millis(settings.parse_timeout_ms);
    match timeout(parse_limit, next_event(&mut events)).await {
        Err(_) => {
            error!("Parsing timeout");
            let _ = child.start_kill();
            return Ok(SandboxOutcome::ParseTimeout);
        }
        Ok(event) => match event? {
            Some(RunnerEvent::Compiled) => debug!("Snippet compiled"),
            Some(RunnerEvent::Syntax { message }) => {
                warn!("Snippet rejected by runtime: {}", message);
                return Ok(SandboxOutcome::ParseError(message));
            }
            Some(RunnerEvent::MockError { name, message }) => {
                return Err(SandboxError::MockLoad {
                    name,
                    reason: message,
                });
            }
            Some(other) => return Ok(unexpected(other)),
            None => return Ok(exited(&mut child).await),
        },
    }

    let execution_limit = Duration::from_millis(settings.execution_timeout_ms);
    let outcome = match timeout(execution_limit, next_event(&mut events)).await {
        Err(_) => {
            warn!("Execution timeout after {}ms", settings.execution_timeout_ms);
            let _ = child.start_kill();
            return Ok(SandboxOutcome::RuntimeTimeout);
        }
        Ok(event) => match event? {
            Some(RunnerEvent::Done { values }) => SandboxOutcome::Captured(values),
            Some(RunnerEvent::Error { message }) => {
                warn!("Snippet failed: {}", message);
                SandboxOutcome::ExecutionError(message)
            }
            Some(RunnerEvent::Timeout) => {
                warn!("Execution timeout after {}ms", settings.execution_timeout_ms);
                SandboxOutcome::RuntimeTimeout
            }
            Some(other) => unexpected(other),
            None => return Ok(exited(&mut child).await),
        },
    };

    if let Err(e) = child.wait().await {
        debug!("Failed to reap runtime: {}", e);
    }
    Ok(outcome)
}

/// Next well-formed event, or `None` once stdout closes.
async fn next_event(events: &mut Lines<BufReader<ChildStdout>>) -> io::Result<Option<RunnerEvent>> {
    while let Some(line) = events.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(event) => return Ok(Some(event)),
            Err(e) => warn!("Ignoring runner output {:?}: {}", line, e),
        }
    }
    Ok(None)
}

fn unexpected(event: RunnerEvent) -> SandboxOutcome {
    SandboxOutcome::ExecutionError(format!("unexpected runner event {:?}", event))
}

/// The runtime closed stdout without a final event (crash, out of memory).
async fn exited(child: &mut tokio::process::Child) -> SandboxOutcome {
    let status = match child.wait().await {
        Ok(status) => status.to_string(),
        Err(e) => e.to_string(),
    };
    warn!("Runtime exited without a result: {}", status);
    SandboxOutcome::ExecutionError(format!("runtime exited without a result ({})", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdoc_core::{LocalStorage, ProjectConfig};
    use serde_json::json;
    use std::fs;
    use std::time::Instant;
    use tempfile::{tempdir, TempDir};

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn sandbox_with(config: ProjectConfig) -> (TempDir, Sandbox) {
        let dir = tempdir().unwrap();
        let sandbox = Sandbox::new(dir.path(), Arc::new(LocalStorage), Arc::new(config));
        (dir, sandbox)
    }

    fn sandbox() -> (TempDir, Sandbox) {
        sandbox_with(ProjectConfig {
            sandbox: SandboxSettings {
                parse_timeout_ms: 5000,
                execution_timeout_ms: 2000,
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        })
    }

    #[tokio::test]
    async fn test_captures_logged_values() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let outcome = sandbox.execute("console.log(1+1)").await.unwrap();
        assert_eq!(outcome, SandboxOutcome::Captured(vec![json!(2)]));
    }

    #[tokio::test]
    async fn test_last_call_wins() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let values = sandbox
            .run_code("console.log('first'); console.error({ a: 1 }, [2]);")
            .await
            .unwrap();
        assert_eq!(values, vec![json!({ "a": 1 }), json!([2])]);
    }

    #[tokio::test]
    async fn test_typescript_and_helpers() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let values = sandbox
            .run_code(
                "interface Item { price: number }\n\
                 const items: Item[] = [{ price: 2 }, { price: 3 }];\n\
                 const total = computed<number>(() => items.reduce((s, i) => s + i.price, 0));\n\
                 const count = ref(items.length);\n\
                 await Promise.resolve();\n\
                 console.log(total.value, count);",
            )
            .await
            .unwrap();
        assert_eq!(values, vec![json!(5), json!(2)]);
    }

    #[tokio::test]
    async fn test_thrown_error_yields_nothing() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let outcome = sandbox
            .execute("console.log(1); throw new Error('boom');")
            .await
            .unwrap();
        assert_eq!(outcome, SandboxOutcome::ExecutionError("boom".into()));
        assert!(outcome.into_values().is_empty());
    }

    #[tokio::test]
    async fn test_pending_snippet_times_out() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox_with(ProjectConfig {
            sandbox: SandboxSettings {
                parse_timeout_ms: 5000,
                execution_timeout_ms: 300,
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        });

        let start = Instant::now();
        let outcome = sandbox.execute("await new Promise(() => {});").await.unwrap();
        assert_eq!(outcome, SandboxOutcome::RuntimeTimeout);
        assert!(start.elapsed() < Duration::from_millis(300 + 5000));

        let outcome = sandbox.execute("while (true) {}").await.unwrap();
        assert_eq!(outcome, SandboxOutcome::RuntimeTimeout);
    }

    #[tokio::test]
    async fn test_parse_errors() {
        let (_dir, sandbox) = sandbox();

        let outcome = sandbox.execute("const = ;").await.unwrap();
        assert!(matches!(outcome, SandboxOutcome::ParseError(_)));
        assert!(outcome.into_values().is_empty());

        let outcome = sandbox.execute("import { ref } from 'vue'").await.unwrap();
        assert!(matches!(outcome, SandboxOutcome::ParseError(ref m) if m.contains("Imports")));
    }

    #[tokio::test]
    async fn test_slow_compile_is_a_parse_timeout() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox_with(ProjectConfig {
            sandbox: SandboxSettings {
                parse_timeout_ms: 1,
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        });

        let outcome = sandbox.execute("console.log(1)").await.unwrap();
        assert_eq!(outcome, SandboxOutcome::ParseTimeout);
        assert!(outcome.into_values().is_empty());
    }

    #[tokio::test]
    async fn test_lowered_typescript_runs() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let values = sandbox
            .run_code(
                "enum Color { Red, Green = 5, Blue }\n\
                 namespace Geo { export const unit = 2; }\n\
                 class Point { constructor(public x: number, private y = 1) {} }\n\
                 function scale(this: void, n: number) { return n * Geo.unit; }\n\
                 console.log(Color.Blue, Color[5], new Point(3).x, scale(4));",
            )
            .await
            .unwrap();
        assert_eq!(values, vec![json!(6), json!("Green"), json!(3), json!(8)]);
    }

    #[tokio::test]
    async fn test_mocks_are_injected() {
        if !node_available() {
            return;
        }
        let (dir, sandbox) = sandbox_with(ProjectConfig {
            vm_context_mocks: [
                ("user".to_string(), "mocks/user.json".to_string()),
                ("api".to_string(), "mocks/api.js".to_string()),
            ]
            .into_iter()
            .collect(),
            sandbox: SandboxSettings {
                parse_timeout_ms: 5000,
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        });
        fs::create_dir_all(dir.path().join("mocks")).unwrap();
        fs::write(dir.path().join("mocks/user.json"), r#"{ "name": "Ada" }"#).unwrap();
        fs::write(dir.path().join("mocks/api.js"), "{ double: (n) => n * 2 }").unwrap();

        let values = sandbox
            .run_code("const u = user(); u.name = 'x'; console.log(user().name, api.double(21));")
            .await
            .unwrap();
        assert_eq!(values, vec![json!("Ada"), json!(42)]);
    }

    #[tokio::test]
    async fn test_broken_script_mock_is_fatal() {
        if !node_available() {
            return;
        }
        let (dir, sandbox) = sandbox_with(ProjectConfig {
            vm_context_mocks: [("api".to_string(), "api.js".to_string())].into_iter().collect(),
            sandbox: SandboxSettings {
                parse_timeout_ms: 5000,
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        });
        fs::write(dir.path().join("api.js"), "{ broken: ").unwrap();

        let err = sandbox.execute("console.log(1)").await.unwrap_err();
        assert!(matches!(err, SandboxError::MockLoad { ref name, .. } if name == "api"));
    }

    #[tokio::test]
    async fn test_missing_mock_aborts_before_running() {
        let (_dir, sandbox) = sandbox_with(ProjectConfig {
            vm_context_mocks: [("api".to_string(), "api.json".to_string())].into_iter().collect(),
            ..ProjectConfig::default()
        });

        let err = sandbox.execute("console.log(1)").await.unwrap_err();
        assert!(matches!(err, SandboxError::MockNotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_runs_keep_their_own_values() {
        if !node_available() {
            return;
        }
        let (_dir, sandbox) = sandbox();

        let (a, b) = tokio::join!(
            sandbox.run_code("await new Promise((r) => setTimeout(r, 50)); console.log('a')"),
            sandbox.run_code("console.log('b')"),
        );
        assert_eq!(a.unwrap(), vec![json!("a")]);
        assert_eq!(b.unwrap(), vec![json!("b")]);
    }

    #[tokio::test]
    async fn test_missing_runtime() {
        let (_dir, sandbox) = sandbox_with(ProjectConfig {
            sandbox: SandboxSettings {
                runtime: "fdoc-no-such-runtime".into(),
                ..SandboxSettings::default()
            },
            ..ProjectConfig::default()
        });

        let err = sandbox.execute("console.log(1)").await.unwrap_err();
        assert!(matches!(err, SandboxError::RuntimeUnavailable { .. }));
    }
}
