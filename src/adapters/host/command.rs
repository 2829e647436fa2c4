use std::process::Output;

use tokio::process::Command;
use tracing::debug;

use crate::ports::{ProbeError, ProbeResult};

/// Decode tool output. Windows tools sometimes write UTF-16LE instead of UTF-8.
pub fn decode_cmd_stdout(bytes: &[u8]) -> String {
    if let Ok(utf8) = std::str::from_utf8(bytes) {
        return utf8.to_string();
    }

    if bytes.len() >= 2 && bytes.len() % 2 == 0 {
        let u16buf: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&u16buf) {
            return s;
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Stdout of a finished command, or its stderr as the failure message
fn checked_stdout(command: &str, output: Output) -> ProbeResult<String> {
    if output.status.success() {
        return Ok(decode_cmd_stdout(&output.stdout));
    }

    let stderr = decode_cmd_stdout(&output.stderr);
    let message = match stderr.trim() {
        "" => format!("exited with {}", output.status),
        trimmed => trimmed.to_string(),
    };
    Err(ProbeError::command(command, message))
}

/// Run to completion. Dropping the future kills the child, so a capture
/// deadline never leaves a tool running behind the snapshot.
async fn output_of(command: &mut Command) -> std::io::Result<Output> {
    command.kill_on_drop(true).output().await
}

pub async fn run_nvidia_smi(args: &[&str]) -> ProbeResult<String> {
    let output = match output_of(Command::new("nvidia-smi").args(args)).await {
        Ok(output) => output,
        #[cfg(target_os = "windows")]
        Err(_) => output_of(Command::new(r"C:\Windows\System32\nvidia-smi.exe").args(args))
            .await
            .map_err(|e| ProbeError::command("nvidia-smi", e.to_string()))?,
        #[cfg(not(target_os = "windows"))]
        Err(e) => return Err(ProbeError::command("nvidia-smi", e.to_string())),
    };
    checked_stdout("nvidia-smi", output)
}

/// Run a script with PowerShell forced to UTF-8 output
#[cfg(target_os = "windows")]
pub async fn run_powershell(script: &str) -> ProbeResult<String> {
    let wrapped_script = format!(
        "[Console]::OutputEncoding=[System.Text.UTF8Encoding]::new($false); $OutputEncoding=[System.Text.UTF8Encoding]::new($false); {script}"
    );
    let args = ["-NoProfile", "-NonInteractive", "-Command", wrapped_script.as_str()];
    debug!(script, "running powershell");

    let output = match output_of(Command::new("powershell").args(args)).await {
        Ok(output) => output,
        Err(_) => output_of(
            Command::new(r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe").args(args),
        )
        .await
        .map_err(|e| ProbeError::command("powershell", e.to_string()))?,
    };
    checked_stdout("powershell", output)
}

/// Login sessions from the utmp records, in the C locale
#[cfg(unix)]
pub async fn run_who() -> ProbeResult<String> {
    let output = output_of(Command::new("who").env("LC_ALL", "C"))
        .await
        .map_err(|e| ProbeError::command("who", e.to_string()))?;
    checked_stdout("who", output)
}

/// `query user` exits non-zero when nobody is logged in
#[cfg(target_os = "windows")]
pub async fn run_query_user() -> ProbeResult<String> {
    let output = output_of(Command::new("query").arg("user"))
        .await
        .map_err(|e| ProbeError::command("query user", e.to_string()))?;
    if !output.status.success() && output.stdout.is_empty() {
        debug!(stderr = %decode_cmd_stdout(&output.stderr).trim(), "no interactive sessions");
        return Ok(String::new());
    }
    checked_stdout("query user", output)
}

/// Raw nvidia-smi GPU listing, `None` when the tool is missing or fails
pub async fn query_nvidia_gpus() -> Option<String> {
    match run_nvidia_smi(&[
        "--query-gpu=name,memory.total,driver_version",
        "--format=csv,noheader,nounits",
    ])
    .await
    {
        Ok(stdout) => Some(stdout),
        Err(e) => {
            debug!(error = %e, "nvidia-smi unavailable");
            None
        }
    }
}
