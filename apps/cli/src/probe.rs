use std::path::Path;

use dubdeck_core::{DubdeckError, Result};
use tokio::process::Command;

/// Container duration in seconds, as reported by ffprobe.
pub async fn probe_duration(video_path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(video_path)
        .output()
        .await
        .map_err(|e| DubdeckError::ProbeFailed {
            path: video_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DubdeckError::ProbeFailed {
            path: video_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        DubdeckError::ProbeFailed {
            path: video_path.to_path_buf(),
            reason: "no duration in ffprobe output".to_string(),
        }
    })
}

fn parse_probe_output(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .find_map(|line| line.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        assert_eq!(parse_probe_output("12.480000\n"), Some(12.48));
        assert_eq!(parse_probe_output("N/A\n"), None);
        assert_eq!(parse_probe_output(""), None);
    }
}
