//! `pactl` backed audio server.
//!
//! Works against PulseAudio and against PipeWire through `pipewire-pulse`.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::{PwError, PwResult};
use crate::link::LoopbackParams;
use crate::server::AudioServer;
use crate::sink::{SinkRecord, VirtualSinkProps, parse_short_sinks};

/// Audio server reached by running `pactl`.
#[derive(Debug, Clone)]
pub struct PactlServer {
    program: String,
}

impl Default for PactlServer {
    fn default() -> Self {
        Self { program: "pactl".to_string() }
    }
}

impl PactlServer {
    /// Use a different `pactl` binary.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Run `pactl` with arguments and return its stdout.
    async fn run(&self, args: &[String]) -> PwResult<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        trace!(%command, "Running");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PwError::SpawnFailed {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PwError::CommandFailed { command, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn load_module(&self, module: &str, module_args: Vec<String>) -> PwResult<u32> {
        let mut args = vec!["load-module".to_string(), module.to_string()];
        args.extend(module_args);

        let stdout = self.run(&args).await?;
        let index = stdout.trim().parse().map_err(|_| PwError::UnexpectedOutput {
            command: format!("load-module {module}"),
            output: stdout.trim().to_string(),
        })?;

        debug!(module, index, "Module loaded");
        Ok(index)
    }
}

impl AudioServer for PactlServer {
    async fn list_sinks(&self) -> PwResult<Vec<SinkRecord>> {
        let args = ["list", "short", "sinks"].map(String::from);
        let stdout = self.run(&args).await?;
        Ok(parse_short_sinks(&stdout))
    }

    async fn load_null_sink(&self, props: &VirtualSinkProps) -> PwResult<u32> {
        self.load_module("module-null-sink", props.module_args())
            .await
            .map_err(|e| PwError::SinkCreationFailed(format!("{}: {e}", props.name)))
    }

    async fn load_loopback(&self, params: &LoopbackParams) -> PwResult<u32> {
        self.load_module("module-loopback", params.module_args()).await.map_err(|e| {
            PwError::LoopbackCreationFailed(format!("{} -> {}: {e}", params.source(), params.sink))
        })
    }

    async fn set_sink_volume(&self, sink: &str, percent: u32) -> PwResult<()> {
        let args = ["set-sink-volume".to_string(), sink.to_string(), format!("{percent}%")];
        self.run(&args)
            .await
            .map(|_| ())
            .map_err(|e| PwError::VolumeControlFailed(format!("{sink}: {e}")))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write a stand-in `pactl` that records its argv next to itself.
    fn fake_pactl(dir: &TempDir, body: &str) -> PactlServer {
        let path = dir.path().join("pactl");
        let script = format!("#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/args\"\n{body}\n");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        PactlServer::with_program(path.to_str().unwrap())
    }

    fn recorded_args(dir: &TempDir) -> Vec<String> {
        std::fs::read_to_string(dir.path().join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_set_sink_volume_passes_percent() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(&dir, "exit 0");

        server.set_sink_volume("chatmix", 35).await.unwrap();

        assert_eq!(recorded_args(&dir), vec!["set-sink-volume chatmix 35%"]);
    }

    #[tokio::test]
    async fn test_list_sinks_parses_short_listing() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(
            &dir,
            "printf '0\\tgamemix\\tmodule-null-sink.c\\ts16le 2ch 48000Hz\\tIDLE\\n'",
        );

        let sinks = server.list_sinks().await.unwrap();

        assert_eq!(recorded_args(&dir), vec!["list short sinks"]);
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name, "gamemix");
    }

    #[tokio::test]
    async fn test_load_null_sink_returns_module_index() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(&dir, "echo 536870913");

        let index = server.load_null_sink(&VirtualSinkProps::stereo("gamemix")).await.unwrap();

        assert_eq!(index, 536_870_913);
        let args = recorded_args(&dir);
        assert!(args[0].starts_with("load-module module-null-sink "), "{args:?}");
        assert!(args[0].contains(" sink_name=gamemix"), "{args:?}");
    }

    #[tokio::test]
    async fn test_load_loopback_args() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(&dir, "echo 7");

        let index = server.load_loopback(&LoopbackParams::new("chatmix", "headset")).await.unwrap();

        assert_eq!(index, 7);
        assert_eq!(
            recorded_args(&dir),
            vec!["load-module module-loopback source=chatmix.monitor sink=headset"]
        );
    }

    #[tokio::test]
    async fn test_non_numeric_module_index() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(&dir, "echo 'Module loaded'");

        assert_matches!(
            server.load_module("module-null-sink", Vec::new()).await,
            Err(PwError::UnexpectedOutput { output, .. }) if output == "Module loaded"
        );
        assert_matches!(
            server.load_null_sink(&VirtualSinkProps::stereo("gamemix")).await,
            Err(PwError::SinkCreationFailed(msg)) if msg.starts_with("gamemix")
        );
    }

    #[tokio::test]
    async fn test_failed_command_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let server = fake_pactl(&dir, "echo 'Connection failure: Connection refused' >&2\nexit 1");

        assert_matches!(
            server.list_sinks().await,
            Err(PwError::CommandFailed { stderr, .. })
                if stderr == "Connection failure: Connection refused"
        );
        assert_matches!(
            server.set_sink_volume("chatmix", 10).await,
            Err(PwError::VolumeControlFailed(msg)) if msg.contains("Connection refused")
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let server = PactlServer::with_program("/nonexistent/chatmix-pactl");
        assert_matches!(
            server.list_sinks().await,
            Err(PwError::SpawnFailed { program, .. }) if program == "/nonexistent/chatmix-pactl"
        );
    }
}
