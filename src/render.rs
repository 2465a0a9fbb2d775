//! Output rendering for streamed responses.
//!
//! The accumulator and orchestrator write through the [`Renderer`] trait so
//! the chat loop can print to a terminal while tests capture output.

use std::io::{self, Stdout, Write};

use crate::types::Citation;

/// ANSI escape code for dim text (used for citation lists).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for citation titles).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for interruptions).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a chunk of response text.
    ///
    /// This is called incrementally as fragments arrive.
    fn print_text(&mut self, text: &str);

    /// Print the sources that grounded a response.
    fn print_citations(&mut self, citations: &[Citation]);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a response is complete.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    mid_line: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            mid_line: false,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn end_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.mid_line = !text.ends_with('\n');
        self.flush();
    }

    fn print_citations(&mut self, citations: &[Citation]) {
        if citations.is_empty() {
            return;
        }
        self.end_line();
        if self.use_color {
            println!("{ANSI_DIM}Sources:{ANSI_RESET}");
        } else {
            println!("Sources:");
        }
        for (idx, citation) in citations.iter().enumerate() {
            if self.use_color {
                println!(
                    "  [{}] {ANSI_CYAN}{}{ANSI_RESET} {ANSI_DIM}{}{ANSI_RESET}",
                    idx + 1,
                    citation.title,
                    citation.uri
                );
            } else {
                println!("  [{}] {} {}", idx + 1, citation.title, citation.uri);
            }
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.end_line();
        if self.use_color {
            eprintln!("{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.end_line();
        println!("{info}");
    }

    fn finish_response(&mut self) {
        self.end_line();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.end_line();
        if self.use_color {
            println!("{ANSI_YELLOW}[interrupted]{ANSI_RESET}");
        } else {
            println!("[interrupted]");
        }
        self.flush();
    }
}

/// Renderer that keeps everything it is given in memory.
///
/// Useful for non-interactive callers and for asserting on output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferRenderer {
    /// Concatenated response text.
    pub text: String,
    /// Every citation list printed, in order.
    pub citations: Vec<Vec<Citation>>,
    /// Error messages, in order.
    pub errors: Vec<String>,
    /// Informational messages, in order.
    pub info: Vec<String>,
    /// Number of completed responses.
    pub finished: usize,
    /// Number of interrupted responses.
    pub interrupted: usize,
}

impl BufferRenderer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for BufferRenderer {
    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn print_citations(&mut self, citations: &[Citation]) {
        self.citations.push(citations.to_vec());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.info.push(info.to_string());
    }

    fn finish_response(&mut self) {
        self.finished += 1;
    }

    fn print_interrupted(&mut self) {
        self.interrupted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn buffer_collects_everything() {
        let mut buffer = BufferRenderer::new();
        buffer.print_text("Hel");
        buffer.print_text("lo");
        buffer.print_citations(&[Citation::new("Doc", "https://doc")]);
        buffer.print_error("boom");
        buffer.finish_response();
        assert_eq!(buffer.text, "Hello");
        assert_eq!(buffer.citations.len(), 1);
        assert_eq!(buffer.errors, vec!["boom".to_string()]);
        assert_eq!(buffer.finished, 1);
        assert_eq!(buffer.interrupted, 0);
    }
}
