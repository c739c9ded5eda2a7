//! Output sinks for `print` and `println`.
//!
//! Output can go to stdout (the `lama` binary), to a buffer (tests and
//! embedding hosts that capture output), or nowhere.
//!
//! Enum dispatch keeps the builtin print path free of vtable calls.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where program output goes.
pub enum OutputSink {
    Stdout,
    /// Captures everything for later inspection.
    Buffer(Mutex<String>),
    /// Discards all output.
    Silent,
}

impl OutputSink {
    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => println!("{msg}"),
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => {
                print!("{msg}");
                // Partial lines would otherwise sit in the buffer until exit.
                let _ = std::io::stdout().flush();
            }
            Self::Buffer(buf) => buf.lock().push_str(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for sinks that do not capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Clear captured output.
    pub fn clear(&self) {
        if let Self::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stdout => "Stdout",
            Self::Buffer(_) => "Buffer",
            Self::Silent => "Silent",
        };
        f.write_str(name)
    }
}

/// Output sink shared between a context and its host.
pub type SharedOutput = Arc<OutputSink>;

pub fn stdout_output() -> SharedOutput {
    Arc::new(OutputSink::Stdout)
}

pub fn buffer_output() -> SharedOutput {
    Arc::new(OutputSink::Buffer(Mutex::new(String::new())))
}

pub fn silent_output() -> SharedOutput {
    Arc::new(OutputSink::Silent)
}

#[cfg(test)]
mod tests;
