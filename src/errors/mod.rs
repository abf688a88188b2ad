//! Error handling for the eis front end
//!
//! Provides the shared source-span type, the error type used to unwind the
//! parser to a declaration boundary, and the diagnostics engine every phase
//! reports through.

mod diagnostic;

use std::fmt;
use std::ops::Range;
use thiserror::Error;

use diagnostic::{render_note, render_report};

/// A span in the source code, represented as a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the length of this span
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl From<Range<usize>> for SourceSpan {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<SourceSpan> for Range<usize> {
    fn from(span: SourceSpan) -> Self {
        span.start..span.end
    }
}

/// The error type used to abort the current declaration
///
/// Every error is reported through [`Diagnostics`] at the point it is
/// discovered; the value itself only carries enough to unwind with `?` to
/// the declaration boundary, where the parser synchronizes.
#[derive(Error, Debug)]
pub enum EisError {
    #[error("{message}")]
    Parse { message: String, span: SourceSpan },

    #[error("found unexpected EOF while parsing")]
    UnexpectedEof { span: SourceSpan },
}

impl EisError {
    /// Get the source span this error is anchored at
    pub fn span(&self) -> SourceSpan {
        match self {
            EisError::Parse { span, .. } => *span,
            EisError::UnexpectedEof { span } => *span,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, span: SourceSpan) -> Self {
        EisError::Parse {
            message: message.into(),
            span,
        }
    }
}

/// Result type alias for front-end operations
pub type EisResult<T> = Result<T, EisError>;

/// Severity of an emitted diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    RuntimeError,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::RuntimeError => "runtime error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where rendered diagnostics go
enum Sink {
    Stderr,
    Memory(Vec<u8>),
}

/// The diagnostics engine shared by every phase
///
/// Conceptually process-wide, but passed explicitly so the phases stay
/// testable. The parser swaps `source`/`module_name` around nested module
/// parses and restores them afterwards. Emission is immediate and ordered;
/// nothing is buffered or retried.
pub struct Diagnostics {
    module_name: String,
    source: String,
    had_error: bool,
    had_runtime_error: bool,
    sink: Sink,
}

impl Diagnostics {
    /// Create a diagnostics engine that reports to standard error
    pub fn new() -> Self {
        Self {
            module_name: String::new(),
            source: String::new(),
            had_error: false,
            had_runtime_error: false,
            sink: Sink::Stderr,
        }
    }

    /// Create a diagnostics engine that collects output in memory
    ///
    /// Used by tests to assert on rendered reports.
    pub fn buffered() -> Self {
        Self {
            sink: Sink::Memory(Vec::new()),
            ..Self::new()
        }
    }

    /// Set the source text diagnostics are rendered against
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Set the module name used in report headers
    pub fn set_module_name(&mut self, name: impl Into<String>) {
        self.module_name = name.into();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Emit a warning anchored at `span`
    pub fn warning(&mut self, message: &str, span: SourceSpan) {
        self.emit(Severity::Warning, message, Some(span));
    }

    /// Emit an error anchored at `span` and set the error flag
    pub fn error(&mut self, message: &str, span: SourceSpan) {
        self.had_error = true;
        self.emit(Severity::Error, message, Some(span));
    }

    /// Emit a runtime error anchored at `span`
    ///
    /// Never produced by the front end itself; the evaluator reports through
    /// the same engine.
    pub fn runtime_error(&mut self, message: &str, span: SourceSpan) {
        self.had_runtime_error = true;
        self.emit(Severity::RuntimeError, message, Some(span));
    }

    /// Emit a note attached (by adjacency) to the previous report
    pub fn note(&mut self, message: &str) {
        let colored = matches!(self.sink, Sink::Stderr);
        let rendered = render_note(message, colored);
        self.write(&rendered);
    }

    fn emit(&mut self, severity: Severity, message: &str, span: Option<SourceSpan>) {
        let colored = matches!(self.sink, Sink::Stderr);
        let rendered = render_report(
            severity,
            message,
            span,
            &self.module_name,
            &self.source,
            colored,
        );
        self.write(&rendered);
    }

    fn write(&mut self, rendered: &[u8]) {
        use std::io::Write;
        match &mut self.sink {
            Sink::Stderr => {
                let _ = std::io::stderr().write_all(rendered);
            }
            Sink::Memory(buffer) => buffer.extend_from_slice(rendered),
        }
    }

    /// Take the rendered output collected so far (buffered engines only)
    pub fn take_output(&mut self) -> String {
        match &mut self.sink {
            Sink::Memory(buffer) => String::from_utf8_lossy(&std::mem::take(buffer)).into_owned(),
            Sink::Stderr => String::new(),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
