use std::{fmt, rc::Rc};

use smallvec::SmallVec;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{position::Span, scope::Context};

/// Error kinds surfaced to Radon programs.
///
/// The string representation matches the variant name exactly
/// (e.g. `RTError` -> "RTError") and is what the traceback footer prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorKind {
    /// Lexer: a character that starts no token.
    IllegalCharError,
    /// Lexer: a character was required to complete a token (e.g. `!` without `=`).
    ExpectedCharError,
    /// Parser: the token stream does not match the grammar.
    InvalidSyntaxError,
    /// Generic runtime failure.
    RTError,
    /// `require` could not locate or open a module.
    #[strum(serialize = "RNModuleNotFoundError")]
    RNModuleNotFoundError,
    /// Tag-bearing runtime errors.
    TypeError,
    NameError,
    AttributeError,
    IndexError,
    KeyError,
    ValueError,
}

/// One rendered traceback frame: the file and line where execution entered
/// the named context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub file: Rc<str>,
    pub line: u32,
    pub context: Rc<str>,
}

/// A Radon error: kind tag, message, source span, and the call-stack frames
/// captured from the context chain at the point the error was raised.
///
/// Lexer and parser errors carry no frames; runtime errors carry one frame
/// per context ancestor, outermost first (so the innermost frame renders
/// last, as the traceback format requires).
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub frames: SmallVec<[StackFrame; 4]>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            frames: SmallVec::new(),
        }
    }

    /// Captures traceback frames by walking the context chain.
    ///
    /// The innermost frame uses the error's own span; each outer frame uses
    /// the position at which its child context was entered.
    #[must_use]
    pub fn with_trace(mut self, context: &Rc<Context>) -> Self {
        let mut frames: SmallVec<[StackFrame; 4]> = SmallVec::new();
        let mut pos = self.span.start.clone();
        let mut ctx = Some(Rc::clone(context));
        while let Some(current) = ctx {
            frames.push(StackFrame {
                file: Rc::clone(&pos.file),
                line: pos.line,
                context: Rc::clone(&current.display_name),
            });
            match (&current.parent, &current.parent_entry_pos) {
                (Some(parent), Some(entry)) => {
                    pos = entry.clone();
                    ctx = Some(Rc::clone(parent));
                }
                _ => ctx = None,
            }
        }
        frames.reverse();
        self.frames = frames;
        self
    }

    /// Renders the error exactly as it is printed to stderr.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// An `RTError` raised at `span` inside `context`, with frames captured.
    pub fn rt(span: &Span, context: &Rc<Context>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RTError, span.clone(), message).with_trace(context)
    }

    /// A tag-bearing runtime error (`TypeError`, `NameError`, ...) raised at
    /// `span` inside `context`, with frames captured.
    pub fn tagged(kind: ErrorKind, span: &Span, context: &Rc<Context>, message: impl Into<String>) -> Self {
        Self::new(kind, span.clone(), message).with_trace(context)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            writeln!(
                f,
                "File \"{}\", line {}, column {}",
                self.span.start.file, self.span.start.line, self.span.start.column
            )?;
        } else {
            writeln!(f, "Traceback (most recent call last):")?;
            for frame in &self.frames {
                writeln!(f, "  File \"{}\", line {}, in {}", frame.file, frame.line, frame.context)?;
            }
        }
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}
