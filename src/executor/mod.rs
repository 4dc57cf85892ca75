//! A tool for executing commands.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Represents a command executor.
///
/// # Example
///
/// ```rust,no_run
/// # use std::path::PathBuf;
/// # use tubefetch::executor::Executor;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = Executor {
///     executable_path: PathBuf::from("ffmpeg"),
///     timeout: None,
///     args: vec!["-version".to_string()],
/// };
///
/// let output = executor.execute().await?;
/// println!("Output: {}", output.stdout);
///
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    /// The path to the command executable.
    pub executable_path: PathBuf,
    /// The timeout for the process. Transcodes of long videos run unbounded.
    pub timeout: Option<Duration>,

    /// The arguments to pass to the command.
    pub args: Vec<String>,
}

/// Represents the output of a process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// The stdout of the process.
    pub stdout: String,
    /// The stderr of the process.
    pub stderr: String,
    /// The exit code of the process, `-1` when killed by a signal.
    pub code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl Executor {
    /// Executes the command and returns its output, whatever the exit code.
    ///
    /// # Errors
    ///
    /// This function will return an error if the command could not be started, or if the process timed out.
    pub async fn execute(&self) -> Result<ProcessOutput> {
        log::debug!("Executing command: {:?}", self);

        let mut command = tokio::process::Command::new(&self.executable_path);
        command.stdin(std::process::Stdio::null());
        command.stdout(std::process::Stdio::piped());
        command.stderr(std::process::Stdio::piped());

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(0x08000000);
        }

        command.args(&self.args);
        let mut child = command.spawn()?;

        // ffmpeg reports progress on stderr; both pipes are drained so neither fills up.
        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stdout".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stderr".to_string()))?;

        let stdout_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            tokio::io::copy(&mut tokio::io::BufReader::new(stdout_handle), &mut buffer).await?;
            Ok::<Vec<u8>, std::io::Error>(buffer)
        });

        let stderr_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            tokio::io::copy(&mut tokio::io::BufReader::new(stderr_handle), &mut buffer).await?;
            Ok::<Vec<u8>, std::io::Error>(buffer)
        });

        let exit_status = match self.timeout {
            None => child.wait().await?,
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    log::warn!("Process timed out after {:?}, killing it", timeout);

                    if let Err(e) = child.kill().await {
                        log::error!("Failed to kill process after timeout: {}", e);
                    }

                    return Err(Error::Timeout(timeout));
                }
            },
        };

        let stdout = collect(stdout_task).await?;
        let stderr = collect(stderr_task).await?;
        let code = exit_status.code().unwrap_or(-1);

        log::debug!("{:?} exited with code {}", self.executable_path, code);
        Ok(ProcessOutput {
            stdout,
            stderr,
            code,
        })
    }
}

async fn collect(task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>) -> Result<String> {
    let buffer = match task.await {
        Ok(Ok(buffer)) => buffer,
        Ok(Err(e)) => return Err(Error::IO(e)),
        Err(e) => return Err(Error::Command(format!("Output reader failed: {}", e))),
    };

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
