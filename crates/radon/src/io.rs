use std::{
    borrow::Cow,
    cell::RefCell,
    collections::VecDeque,
    io::{self, BufRead, Write as _},
};

/// Trait for handling output from `print` and the other writing builtins.
///
/// Implement this to capture or redirect interpreter output. The default
/// implementation `StdPrint` writes to stdout.
pub trait PrintWriter {
    /// Writes one chunk of formatted output, without adding separators or a
    /// trailing newline.
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()>;

    /// Writes a single character, generally a space or newline terminator.
    fn stdout_push(&mut self, end: char) -> io::Result<()>;
}

thread_local! {
    /// Thread-local stdout buffer for `StdPrint`.
    ///
    /// Buffering keeps interleaved error output (which goes straight to
    /// stderr) readable when stdout is redirected.
    static STDOUT_BUFFER: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl StdPrint {
    /// Flushes the buffered output to stdout.
    pub fn flush() {
        STDOUT_BUFFER.with(|buffer| {
            let mut buffer = buffer.borrow_mut();
            if buffer.is_empty() {
                return;
            }
            let _ = io::stdout().write_all(buffer.as_bytes());
            let _ = io::stdout().flush();
            buffer.clear();
        });
    }
}

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()> {
        STDOUT_BUFFER.with(|buffer| buffer.borrow_mut().push_str(&output));
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> io::Result<()> {
        STDOUT_BUFFER.with(|buffer| buffer.borrow_mut().push(end));
        if end == '\n' {
            Self::flush();
        }
        Ok(())
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        Self::flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> io::Result<()> {
        self.0.push_str(&output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> io::Result<()> {
        self.0.push(end);
        Ok(())
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) -> io::Result<()> {
        Ok(())
    }

    fn stdout_push(&mut self, _end: char) -> io::Result<()> {
        Ok(())
    }
}

/// Trait for the blocking line reads performed by `input` and `input_int`.
///
/// The prompt is routed through the active `PrintWriter` by the caller, so
/// implementations only produce the line itself (without its newline).
pub trait InputReader {
    fn read_line(&mut self) -> io::Result<String>;
}

/// Default `InputReader` that reads from stdin.
#[derive(Debug, Default)]
pub struct StdInput;

impl InputReader for StdInput {
    fn read_line(&mut self) -> io::Result<String> {
        // The prompt sits in the stdout buffer; make it visible first.
        StdPrint::flush();
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "EOF when reading a line"));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// `InputReader` fed from a queue of prepared lines, for tests.
#[derive(Debug, Default)]
pub struct QueuedInput(VecDeque<String>);

impl QueuedInput {
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(lines.into_iter().map(Into::into).collect())
    }
}

impl InputReader for QueuedInput {
    fn read_line(&mut self) -> io::Result<String> {
        self.0
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "EOF when reading a line"))
    }
}
