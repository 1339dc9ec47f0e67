//! Sensor readers.
//!
//! Each reader produces a single text reading: the first line of a sysfs
//! file or of a shell pipeline's output, newline-stripped. Failures are
//! reported to the caller instead of leaving it with stale data.

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;

/// Errors from reading a sensor.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read '{origin}': {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("Empty output from '{origin}'")]
    Empty { origin: String },
}

/// Result type alias for sensor reads.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Read the CPU temperature from a sysfs thermal zone file.
///
/// Returns the raw value as found (millidegrees on Linux), first line
/// only, trailing whitespace stripped.
pub async fn read_cpu_temp(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReadError::Io {
            origin: path.display().to_string(),
            source: e,
        })?;

    first_line(&content).ok_or_else(|| ReadError::Empty {
        origin: path.display().to_string(),
    })
}

/// Run a shell pipeline and capture the first line of its stdout.
///
/// The command is executed through `sh -c` so pipelines like
/// `free -m | awk '/^Mem:/ {print $3}'` work as configured.
pub async fn read_command_first_line(command: &str) -> Result<String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|e| ReadError::Io {
            origin: command.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ReadError::CommandFailed {
            command: command.to_string(),
            status: output.status,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);

    first_line(&stdout).ok_or_else(|| ReadError::Empty {
        origin: command.to_string(),
    })
}

/// Extract the first non-empty-after-trim line of a reading.
fn first_line(content: &str) -> Option<String> {
    let line = content.lines().next()?.trim_end();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("piwatch-sensors-test-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_cpu_temp_strips_trailing_newline() {
        let path = temp_path("cpu_temp");
        std::fs::write(&path, "48312\n").unwrap();

        let reading = read_cpu_temp(&path).await.unwrap();
        assert_eq!(reading, "48312");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_cpu_temp_without_newline() {
        let path = temp_path("cpu_temp_raw");
        std::fs::write(&path, "51234").unwrap();

        let reading = read_cpu_temp(&path).await.unwrap();
        assert_eq!(reading, "51234");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_cpu_temp_missing_file() {
        let result = read_cpu_temp("/nonexistent/thermal_zone0/temp").await;
        assert!(matches!(result, Err(ReadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_cpu_temp_empty_file() {
        let path = temp_path("cpu_temp_empty");
        std::fs::write(&path, "").unwrap();

        let result = read_cpu_temp(&path).await;
        assert!(matches!(result, Err(ReadError::Empty { .. })));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_command_captures_first_line_only() {
        let reading = read_command_first_line("printf 'first line\\nsecond line\\n'")
            .await
            .unwrap();
        assert_eq!(reading, "first line");
    }

    #[tokio::test]
    async fn test_command_pipeline() {
        let reading = read_command_first_line("printf 'a 1\\nb 2\\n' | awk '/^b/ {print $2}'")
            .await
            .unwrap();
        assert_eq!(reading, "2");
    }

    #[tokio::test]
    async fn test_command_nonzero_exit() {
        let result = read_command_first_line("exit 3").await;
        assert!(matches!(result, Err(ReadError::CommandFailed { .. })));
    }

    #[tokio::test]
    async fn test_command_empty_output() {
        let result = read_command_first_line("true").await;
        assert!(matches!(result, Err(ReadError::Empty { .. })));
    }
}
