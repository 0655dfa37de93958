use crate::Span;
use crate::rune::DecodeError;
use crate::value::ValueType;
use std::fmt::{self, Debug, Display};
use std::path::PathBuf;

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

/// Error that can occur when parsing or querying an INI document.
#[derive(Debug, Clone)]
pub struct Error {
    /// The error kind
    pub kind: ErrorKind,
    /// The span where the error occurs.
    ///
    /// Query-time errors and allocation failures carry an empty span.
    pub span: Span,
    /// Line and column information, only available for errors coming from the parser
    pub line_info: Option<(usize, usize)>,
}

impl std::error::Error for Error {}

impl From<(ErrorKind, Span)> for Error {
    fn from((kind, span): (ErrorKind, Span)) -> Self {
        Self {
            kind,
            span,
            line_info: None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            line_info: None,
        }
    }
}

/// Errors that can occur while loading, parsing or querying a document.
#[derive(Clone, PartialEq)]
pub enum ErrorKind {
    /// A required input was missing or malformed, e.g. a query without a key.
    InvalidArgument(&'static str),

    /// The file handed to the loader does not exist.
    FileNotFound(PathBuf),

    /// Reading the source failed for a reason other than a missing file.
    Io(std::io::ErrorKind),

    /// A section header reached the end of its line before its closing `]`.
    UnterminatedHeader,

    /// A section header contained no path segments.
    EmptyHeader,

    /// Two delimiters followed each other, or a delimiter ended the header.
    EmptySegment,

    /// A quoted path segment was not closed.
    UnterminatedQuote,

    /// A backslash escaped a character that has no escape meaning.
    InvalidEscape(char),

    /// An unexpected character was encountered.
    Unexpected(char),

    /// Something other than whitespace or a comment followed a construct
    /// that must end its line.
    TrailingCharacters,

    /// A field line started with `=`.
    MissingKey,

    /// A field line had no `=` after its key.
    MissingEquals,

    /// A quoted value was not closed before the end of its line.
    UnterminatedString,

    /// A construct that is recognised but not supported.
    Unsupported(&'static str),

    /// The backing allocator failed, or the configured memory limit was hit.
    AllocationFailure {
        /// Number of bytes requested by the failing allocation.
        requested: usize,
    },

    /// The source is not valid UTF-8.
    InvalidUtf8(DecodeError),

    /// No section matches the queried path.
    SectionNotFound(String),

    /// The resolved section has no field with the queried key.
    KeyNotFound(String),

    /// The value exists but cannot be read as the requested type.
    TypeMismatch {
        /// The type the caller asked for.
        expected: ValueType,
    },

    /// An index-based lookup went past the end of the enumerated list.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of available entries.
        len: usize,
    },

    /// An invariant of the document was violated.
    Internal(&'static str),
}

impl ErrorKind {
    /// Returns `true` for malformed-source errors.
    ///
    /// The parser recovers from these by skipping to the next line.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::UnterminatedHeader
                | Self::EmptyHeader
                | Self::EmptySegment
                | Self::UnterminatedQuote
                | Self::InvalidEscape(..)
                | Self::Unexpected(..)
                | Self::TrailingCharacters
                | Self::MissingKey
                | Self::MissingEquals
                | Self::UnterminatedString
        )
    }

    /// Returns `true` if the parser must stop at this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailure { .. } | Self::InvalidUtf8(..) | Self::Internal(..)
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidArgument(..) => "invalid-argument",
            Self::FileNotFound(..) => "file-not-found",
            Self::Io(..) => "io",
            Self::UnterminatedHeader => "unterminated-header",
            Self::EmptyHeader => "empty-header",
            Self::EmptySegment => "empty-segment",
            Self::UnterminatedQuote => "unterminated-quote",
            Self::InvalidEscape(..) => "invalid-escape",
            Self::Unexpected(..) => "unexpected",
            Self::TrailingCharacters => "trailing-characters",
            Self::MissingKey => "missing-key",
            Self::MissingEquals => "missing-equals",
            Self::UnterminatedString => "unterminated-string",
            Self::Unsupported(..) => "unsupported",
            Self::AllocationFailure { .. } => "allocation-failure",
            Self::InvalidUtf8(..) => "invalid-utf8",
            Self::SectionNotFound(..) => "section-not-found",
            Self::KeyNotFound(..) => "key-not-found",
            Self::TypeMismatch { .. } => "type-mismatch",
            Self::IndexOutOfRange { .. } => "index-out-of-range",
            Self::Internal(..) => "internal",
        };
        f.write_str(text)
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

struct Escape(char);

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write as _;

        if self.0.is_whitespace() || self.0.is_control() {
            for esc in self.0.escape_default() {
                f.write_char(esc)?;
            }
            Ok(())
        } else {
            f.write_char(self.0)
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidArgument(what) => write!(f, "invalid argument: {what}")?,
            ErrorKind::FileNotFound(path) => write!(f, "file not found: `{}`", path.display())?,
            ErrorKind::Io(kind) => write!(f, "failed to read source: {kind}")?,
            ErrorKind::UnterminatedHeader => f.write_str("section header not closed")?,
            ErrorKind::EmptyHeader => f.write_str("empty section header")?,
            ErrorKind::EmptySegment => f.write_str("empty segment in section path")?,
            ErrorKind::UnterminatedQuote => f.write_str("unterminated quoted segment")?,
            ErrorKind::InvalidEscape(c) => write!(f, "invalid escape character: `{}`", Escape(*c))?,
            ErrorKind::Unexpected(c) => write!(f, "unexpected character found: `{}`", Escape(*c))?,
            ErrorKind::TrailingCharacters => f.write_str("unexpected characters before end of line")?,
            ErrorKind::MissingKey => f.write_str("field has no key")?,
            ErrorKind::MissingEquals => f.write_str("expected `=` after key")?,
            ErrorKind::UnterminatedString => f.write_str("unterminated string")?,
            ErrorKind::Unsupported(what) => write!(f, "unsupported feature: {what}")?,
            ErrorKind::AllocationFailure { requested } => {
                write!(f, "failed to allocate {requested} bytes")?
            }
            ErrorKind::InvalidUtf8(err) => write!(f, "invalid utf-8: {err}")?,
            ErrorKind::SectionNotFound(path) => write!(f, "section `{path}` does not exist")?,
            ErrorKind::KeyNotFound(key) => write!(f, "key `{key}` does not exist")?,
            ErrorKind::TypeMismatch { expected } => {
                write!(f, "value cannot be read as {}", expected.name())?
            }
            ErrorKind::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} entries")?
            }
            ErrorKind::Internal(what) => write!(f, "internal error: {what}")?,
        }
        if let Some((line, col)) = self.line_info {
            write!(f, " at line {}, column {}", line + 1, col + 1)?;
        }
        Ok(())
    }
}
