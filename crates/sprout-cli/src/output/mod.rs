//! Terminal output formatting and utilities.
//!
//! Keeps what the installer prints consistent across commands: status
//! lines on stdout, failures on stderr, colors only where the terminal
//! supports them.

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Create an output handler that never emits escape codes
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    /// Print a step message
    pub fn step(&self, marker: &str, message: &str) {
        println!("{} {}", marker, message);
    }

    /// Print a block of lines to stderr, the first one highlighted
    pub fn failure_block(&self, lines: &[String]) {
        let mut lines = lines.iter();
        if let Some(header) = lines.next() {
            eprintln!("{}", self.colors.red(header));
        }
        for line in lines {
            eprintln!("{}", line);
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
