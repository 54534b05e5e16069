//! Progress and findings output.
//!
//! Findings are streamed as they are discovered, one line per notice, so a
//! reader sees each missing table before its script is written.

use std::io::Write;

/// Receives human-readable progress lines.
pub trait Reporter {
    fn notice(&mut self, text: &str);

    /// An empty separator line.
    fn blank(&mut self) {
        self.notice("");
    }
}

/// Writes notices to stdout, flushing after each line. Write errors, such as
/// a closed pipe, are ignored.
#[derive(Debug, Default)]
pub struct Console;

impl Reporter for Console {
    fn notice(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }
}

/// Keeps notices in memory.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    lines: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines that are not blank separators.
    pub fn messages(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.is_empty())
            .collect()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.lines.iter().any(|l| l == text)
    }
}

impl Reporter for Recorder {
    fn notice(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn notice(&mut self, text: &str) {
        (**self).notice(text);
    }
}
