//! Command runner for external media tools.
//!
//! Every invocation gets a wall-clock limit. On timeout the child is killed
//! and the call fails; there is no partial-progress resumption and no retry.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::error::{AudioError, AudioResult};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Runs external commands with a timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
    log_commands: bool,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            log_commands: true,
        }
    }

    /// Enable or disable debug logging of command lines.
    pub fn with_command_logging(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `cmd` to completion, killing it if it outlives the timeout.
    ///
    /// `tool` names the program in errors and logs.
    pub fn run(&self, tool: &str, mut cmd: Command) -> AudioResult<ToolOutput> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if self.log_commands {
            tracing::debug!("Running {}: {:?}", tool, cmd);
        }

        let mut child = cmd.spawn().map_err(|e| AudioError::spawn_failed(tool, e))?;

        // Drain both pipes on their own threads so a chatty tool cannot block
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = match self.wait_with_deadline(tool, &mut child) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let seconds = self.timeout.as_secs();
                tracing::error!("{} exceeded {}s, killing process", tool, seconds);
                stop_child(&mut child);
                return Err(AudioError::Timeout {
                    tool: tool.to_string(),
                    seconds,
                });
            }
            Err(e) => {
                tracing::error!("Lost track of {}, killing process: {}", tool, e);
                stop_child(&mut child);
                return Err(e);
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr_reader.join().unwrap_or_default()).to_string();

        if !status.success() {
            return Err(AudioError::command_failed(
                tool,
                status.code().unwrap_or(-1),
                stderr_tail(&stderr),
            ));
        }

        Ok(ToolOutput { stdout, stderr })
    }

    /// Poll until the child exits or the deadline passes.
    ///
    /// Returns `None` on timeout (child still running).
    fn wait_with_deadline(
        &self,
        tool: &str,
        child: &mut Child,
    ) -> AudioResult<Option<std::process::ExitStatus>> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let status = child
                .try_wait()
                .map_err(|e| AudioError::io_error(format!("waiting for {}", tool), e))?;

            if let Some(status) = status {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Kill a child that must not outlive its call and reap it.
fn stop_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// Last few stderr lines, for error messages.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_on_success() {
        let runner = ToolRunner::new(Duration::from_secs(10));
        let output = runner.run("sh", sh("printf '12.5'")).unwrap();
        assert_eq!(output.stdout, b"12.5");
    }

    #[test]
    fn reports_exit_code_and_stderr() {
        let runner = ToolRunner::new(Duration::from_secs(10));
        let err = runner.run("sh", sh("echo broken >&2; exit 3")).unwrap_err();
        match err {
            AudioError::CommandFailed {
                exit_code, message, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(message, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn kills_on_timeout() {
        let runner = ToolRunner::new(Duration::from_millis(200));
        let started = Instant::now();
        let err = runner.run("sh", sh("sleep 5")).unwrap_err();
        assert!(matches!(err, AudioError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn stop_child_leaves_no_running_process() {
        let mut child = sh("sleep 5").spawn().unwrap();
        let started = Instant::now();

        stop_child(&mut child);

        assert!(child.try_wait().unwrap().is_some());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn missing_program_is_spawn_failure() {
        let runner = ToolRunner::new(Duration::from_secs(1));
        let err = runner
            .run("nope", Command::new("/nonexistent/definitely-not-a-tool"))
            .unwrap_err();
        assert!(matches!(err, AudioError::SpawnFailed { .. }));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let text: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(&text);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }
}
