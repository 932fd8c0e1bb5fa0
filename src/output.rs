use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing_subscriber::fmt::MakeWriter;

pub const PROFILE_FILE: &str = "orcid_profile.json";
pub const PUBLICATIONS_FILE: &str = "publications.json";
pub const TALKS_FILE: &str = "talks.json";

pub fn output_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(file)
}

/// Write `value` as pretty JSON plus a trailing newline.
///
/// The document goes to a temporary file next to `path` first, so an interrupted write never
/// leaves a truncated file behind.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut body = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    body.push('\n');

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(body.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// `✓ 12 publications → ./publications.json` on stderr.
pub fn report(what: &str, path: &Path) {
    let mark = if colors_enabled() {
        "✓".green().bold().to_string()
    } else {
        "✓".to_string()
    };
    eprintln!("{mark} {what} → {}", path.display());
}

/// Progress bar for the talk sources. Log lines written through `logs` stay above it.
pub fn talk_progress(logs: &LogSink) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} talk sources {msg}",
    )?);
    logs.attach(&bar);
    Ok(bar)
}

/// `tracing` writer for stderr that suspends the attached progress bar around every line.
#[derive(Clone, Default)]
pub struct LogSink {
    bar: Arc<Mutex<Option<ProgressBar>>>,
}

impl LogSink {
    pub fn attach(&self, bar: &ProgressBar) {
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar.clone());
        }
    }
}

pub struct LogLine(Option<ProgressBar>);

impl Write for LogLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.0 {
            Some(bar) => bar.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogLine;

    fn make_writer(&'a self) -> LogLine {
        LogLine(self.bar.lock().ok().and_then(|bar| bar.clone()))
    }
}
