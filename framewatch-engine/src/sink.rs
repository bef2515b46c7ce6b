use crate::traits::OutputSink;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory sink. Unbounded unless `with_max_lines` is used.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    lines: VecDeque<String>,
    max_lines: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_lines(self, max: usize) -> Self {
        self.lock().max_lines = Some(max.max(1));
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    pub fn last_line(&self) -> Option<String> {
        self.lock().lines.back().cloned()
    }

    /// The full visible content.
    pub fn text(&self) -> String {
        let inner = self.lock();
        inner.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lock().lines.iter().any(|l| l.contains(needle))
    }
}

impl OutputSink for MemorySink {
    fn append(&self, line: &str) {
        let mut inner = self.lock();
        inner.lines.push_back(line.to_string());
        if let Some(max) = inner.max_lines {
            while inner.lines.len() > max {
                inner.lines.pop_front();
            }
        }
    }

    fn present(&self, text: &str) {
        let mut inner = self.lock();
        inner.lines.clear();
        inner.lines.push_back(text.to_string());
    }
}

/// Prints to stdout; the terminal provides the scrolling.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn append(&self, line: &str) {
        println!("{line}");
    }

    fn present(&self, text: &str) {
        println!("----\n{text}\n----");
    }
}
