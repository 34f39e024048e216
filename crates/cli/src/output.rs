use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};

/// Where step outputs are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// The runner's output file (`$GITHUB_OUTPUT`), appended to.
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    pub fn new(path: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Self {
        match path.or_else(|| env("GITHUB_OUTPUT").filter(|v| !v.is_empty()).map(PathBuf::from)) {
            Some(path) => Self::File(path),
            None => Self::Stdout,
        }
    }

    pub fn publish(&self, outputs: &[(&str, String)]) -> Result<()> {
        match self {
            Self::File(path) => {
                let delimiter = new_delimiter();
                let mut buf = String::new();
                for (name, value) in outputs {
                    buf.push_str(&format_output(name, value, &delimiter)?);
                }
                append(path, &buf)
            }
            Self::Stdout => write_plain(&mut std::io::stdout().lock(), outputs),
        }
    }
}

fn new_delimiter() -> String { format!("ghadelimiter_{:032x}", rand::random::<u128>()) }

/// Write outputs as `name=value` lines. Multi-line values use the heredoc form.
fn write_plain(w: &mut impl Write, outputs: &[(&str, String)]) -> Result<()> {
    let mut delimiter = None;
    for (name, value) in outputs {
        if value.contains(['\n', '\r']) {
            let delimiter = delimiter.get_or_insert_with(new_delimiter);
            w.write_all(format_output(name, value, delimiter)?.as_bytes())?;
        } else {
            writeln!(w, "{name}={value}")?;
        }
    }
    w.flush()?;
    Ok(())
}

fn append(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write output file {}", path.display()))
}

/// Format one output in the runner's file command syntax.
fn format_output(name: &str, value: &str, delimiter: &str) -> Result<String> {
    if name.contains(delimiter) {
        bail!("Unexpected input: name should not contain the delimiter \"{delimiter}\"");
    }
    if value.contains(delimiter) {
        bail!("Unexpected input: value should not contain the delimiter \"{delimiter}\"");
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Escape data for a workflow command such as `::error::`.
pub fn escape_data(value: &str) -> String {
    value.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

pub fn error_command(message: &str) -> String { format!("::error::{}", escape_data(message)) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_output() {
        assert_eq!(format_output("job_id", "54321", "EOF").unwrap(), "job_id<<EOF\n54321\nEOF\n");
        assert_eq!(
            format_output("job_summary_content", "## Title\n\n- item", "EOF").unwrap(),
            "job_summary_content<<EOF\n## Title\n\n- item\nEOF\n"
        );
        assert_eq!(
            format_output("job_conclusion", "", "EOF").unwrap(),
            "job_conclusion<<EOF\n\nEOF\n"
        );
        assert!(format_output("name", "a\nEOF\nb", "EOF").is_err());
    }

    #[test]
    fn test_publish_appends_to_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "existing<<X\n1\nX\n").unwrap();
        let target = OutputTarget::new(None, |key: &str| {
            (key == "GITHUB_OUTPUT").then(|| file.path().to_string_lossy().into_owned())
        });
        assert_eq!(target, OutputTarget::File(file.path().to_path_buf()));
        target
            .publish(&[("job_id", "54321".to_string()), ("job_status", "completed".to_string())])
            .unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 9);
        assert_eq!(&lines[..3], ["existing<<X", "1", "X"]);
        let delimiter = lines[3].strip_prefix("job_id<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        let header = format!("job_status<<{delimiter}");
        assert_eq!(&lines[4..], ["54321", delimiter, header.as_str(), "completed", delimiter]);
    }

    #[test]
    fn test_write_plain() {
        let mut out = Vec::new();
        write_plain(&mut out, &[
            ("job_id", "54321".to_string()),
            ("job_conclusion", String::new()),
            ("job_summary_url", "https://github.com/o/r/actions/runs/1#summary-2".to_string()),
            ("job_summary_content", "## Title\n\n- item".to_string()),
        ])
        .unwrap();

        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(&lines[..3], [
            "job_id=54321",
            "job_conclusion=",
            "job_summary_url=https://github.com/o/r/actions/runs/1#summary-2",
        ]);
        let delimiter = lines[3].strip_prefix("job_summary_content<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(&lines[4..], ["## Title", "", "- item", delimiter]);
    }

    #[test]
    fn test_output_target_precedence() {
        let env = |key: &str| (key == "GITHUB_OUTPUT").then(|| "/tmp/runner-output".to_string());
        assert_eq!(
            OutputTarget::new(Some(PathBuf::from("out.txt")), env),
            OutputTarget::File(PathBuf::from("out.txt"))
        );
        assert_eq!(
            OutputTarget::new(None, env),
            OutputTarget::File(PathBuf::from("/tmp/runner-output"))
        );
        assert_eq!(OutputTarget::new(None, |_: &str| None), OutputTarget::Stdout);
    }

    #[test]
    fn test_error_command() {
        assert_eq!(
            error_command("Job \"build\" not found in workflow run 12345"),
            "::error::Job \"build\" not found in workflow run 12345"
        );
        assert_eq!(error_command("100% failed\r\nretry"), "::error::100%25 failed%0D%0Aretry");
    }
}
