//! Local venue adapter

use async_trait::async_trait;
use offload_core::{Error, ExecutionAdapter, LocalConfig, Result, Venue};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// On-device inference engine producing a transcription from raw audio
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Engine name used in logs and error messages
    fn name(&self) -> &str;

    /// Transcribe one payload
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Engine that runs an external program on a spooled copy of the payload.
///
/// The payload is written to a temporary `.wav` file whose path is appended
/// to the configured arguments. The transcription is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    command: String,
    args: Vec<String>,
    work_dir: Option<PathBuf>,
}

impl CommandTranscriber {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn from_config(config: &LocalConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            work_dir: config.work_dir.clone(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Directory the payload is spooled into, instead of the system temp dir
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn spool(&self, audio: &[u8]) -> Result<tempfile::NamedTempFile> {
        let file = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("payload-").suffix(".wav");
            match &self.work_dir {
                Some(dir) => builder.tempfile_in(dir),
                None => builder.tempfile(),
            }
        }
        .map_err(|e| Error::local_execution(format!("Failed to create payload file: {}", e)))?;

        tokio::fs::write(file.path(), audio)
            .await
            .map_err(|e| Error::local_execution(format!("Failed to save payload: {}", e)))?;

        Ok(file)
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    fn name(&self) -> &str {
        &self.command
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let file = self.spool(audio).await?;
        debug!(
            "Transcribing {} bytes with {} {:?} {}",
            audio.len(),
            self.command,
            self.args,
            file.path().display()
        );

        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::local_execution(format!("Failed to spawn {}: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::local_execution(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout).map_err(|e| {
            Error::local_execution(format!("{} produced non-UTF-8 output: {}", self.command, e))
        })?;

        Ok(text.trim().to_string())
    }
}

/// Adapter for the local venue, wrapping any transcription engine
#[derive(Clone)]
pub struct LocalAdapter {
    transcriber: Arc<dyn Transcriber>,
}

impl std::fmt::Debug for LocalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdapter")
            .field("engine", &self.transcriber.name())
            .finish()
    }
}

impl LocalAdapter {
    pub fn new(transcriber: impl Transcriber + 'static) -> Self {
        Self {
            transcriber: Arc::new(transcriber),
        }
    }

    /// Local adapter running the configured engine command
    pub fn from_config(config: &LocalConfig) -> Self {
        Self::new(CommandTranscriber::from_config(config))
    }

    pub fn engine(&self) -> &str {
        self.transcriber.name()
    }
}

#[async_trait]
impl ExecutionAdapter for LocalAdapter {
    fn venue(&self) -> Venue {
        Venue::Local
    }

    async fn execute(&self, payload: &[u8]) -> Result<String> {
        self.transcriber
            .transcribe(payload)
            .await
            .map_err(|e| match e {
                Error::LocalExecution(_) => e,
                other => Error::local_execution(format!(
                    "{} engine failed: {}",
                    self.transcriber.name(),
                    other
                )),
            })
    }
}
