// Explicit match/if-let instead of `?` throughout this module, as in the
// rest of the parse path.
#![allow(clippy::question_mark)]

use crate::{
    Span,
    document::{Document, SectionId},
    error::{Error, ErrorKind},
    path,
    rune::{self, Rune},
    value::{ValueTypes, is_blank, trim_blank},
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Lightweight internal error -- zero-sized, no drop glue.
// When a method returns Err(ParseError), the full error details have already
// been written into Parser::error_kind / Parser::error_span.
// ---------------------------------------------------------------------------

#[derive(Copy, Clone)]
struct ParseError;

/// What the scan loop does with the line under the cursor.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// Between lines: skipping blanks, comments and empty lines.
    Scanning,
    /// At the `[` of a section header.
    Header,
    /// At the first rune of a `key = value` line.
    Field,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a, 'd> {
    bytes: &'a [u8],
    cursor: usize,
    state: State,

    doc: &'d mut Document,
    /// Section that receives field lines.
    current: SectionId,

    // Error context -- populated just before returning ParseError
    error_span: Span,
    error_kind: Option<ErrorKind>,
    /// The first error of this pass. Later errors only go to the diagnostics.
    first_error: Option<Error>,

    /// Last offset converted by `to_linecol`, as `(offset, line, line_start)`.
    linecol_mark: (usize, usize, usize),

    // Reusable scratch buffer for quoted values
    string_buf: String,
}

impl<'a, 'd> Parser<'a, 'd> {
    fn new(bytes: &'a [u8], doc: &'d mut Document) -> Self {
        Parser {
            bytes,
            cursor: 0,
            state: State::Scanning,
            doc,
            current: SectionId::ROOT,
            error_span: Span::new(0, 0),
            error_kind: None,
            first_error: None,
            linecol_mark: (0, 0, 0),
            string_buf: String::new(),
        }
    }

    /// `bytes[start..end]` as a `&str`. The range must have been walked rune
    /// by rune, so this only fails on a cursor bug.
    fn str_slice(&mut self, start: usize, end: usize) -> Result<&'a str, ParseError> {
        let bytes = self.bytes;
        match std::str::from_utf8(&bytes[start..end]) {
            Ok(s) => Ok(s),
            Err(_) => Err(self.set_error(start, Some(end), ErrorKind::Internal("slice off rune boundary"))),
        }
    }

    // -- error helpers ------------------------------------------------------

    #[cold]
    fn set_error(&mut self, start: usize, end: Option<usize>, kind: ErrorKind) -> ParseError {
        self.error_span = Span::new(start as u32, end.unwrap_or(start + 1) as u32);
        self.error_kind = Some(kind);
        ParseError
    }

    #[cold]
    fn set_error_spanned(&mut self, error: Error) -> ParseError {
        self.error_span = error.span;
        self.error_kind = Some(error.kind);
        ParseError
    }

    fn take_error(&mut self) -> Error {
        let kind = match self.error_kind.take() {
            Some(kind) => kind,
            None => ErrorKind::Internal("error reported without a kind"),
        };
        let span = self.error_span;
        let line_info = Some(self.to_linecol(span.start as usize));
        Error {
            kind,
            span,
            line_info,
        }
    }

    /// Errors arrive in source order, so each conversion resumes from the
    /// previous one instead of rescanning from the start.
    fn to_linecol(&mut self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.bytes.len());
        let (from, mut line_num, mut line_start) = if offset >= self.linecol_mark.0 {
            self.linecol_mark
        } else {
            (0, 0, 0)
        };
        for (i, &b) in self.bytes[from..offset].iter().enumerate() {
            if b == b'\n' {
                line_num += 1;
                line_start = from + i + 1;
            }
        }
        self.linecol_mark = (offset, line_num, line_start);
        (line_num, offset - line_start)
    }

    /// Records the pending error. Returns `true` if the pass must stop.
    fn report(&mut self) -> bool {
        let error = self.take_error();
        let fatal = error.kind.is_fatal();
        if !fatal {
            tracing::debug!(
                error = %error,
                code = %error.kind,
                "recovering at next line"
            );
        }
        if self.first_error.is_none() {
            self.first_error = Some(error.clone());
        }
        self.doc.push_diagnostic(error);
        fatal
    }

    // -- cursor operations --------------------------------------------------

    /// Decodes the rune at the cursor without consuming it.
    #[inline]
    fn peek(&mut self) -> Result<Rune, ParseError> {
        match rune::decode(self.bytes, self.cursor) {
            Ok(r) => Ok(r),
            Err(e) => Err(self.set_error(e.offset(), None, ErrorKind::InvalidUtf8(e))),
        }
    }

    #[inline]
    fn advance(&mut self, r: Rune) {
        self.cursor += r.width as usize;
    }

    fn eat_blanks(&mut self) -> Result<(), ParseError> {
        loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => return Err(e),
            };
            if r.is_end() || !is_blank(r.ch) {
                return Ok(());
            }
            self.advance(r);
        }
    }

    /// Returns `true` if the cursor is on a `\r` that ends the line: one
    /// followed by `\n` or by the end of input.
    #[inline]
    fn at_cr_break(&self) -> bool {
        self.bytes.get(self.cursor) == Some(&b'\r')
            && matches!(self.bytes.get(self.cursor + 1), None | Some(b'\n' | 0))
    }

    /// Returns `true` at the end of the line: end of input, `\n`, `\r\n` or
    /// a final `\r`.
    fn at_line_end(&mut self) -> Result<bool, ParseError> {
        let r = match self.peek() {
            Ok(r) => r,
            Err(e) => return Err(e),
        };
        Ok(r.is_end() || r.ch == '\n' || self.at_cr_break())
    }

    /// Moves the cursor past the next `\n`, or to the end of input.
    fn skip_line(&mut self) -> Result<(), ParseError> {
        loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => return Err(e),
            };
            if r.is_end() {
                return Ok(());
            }
            self.advance(r);
            if r.ch == '\n' {
                return Ok(());
            }
        }
    }

    /// After a header or a quoted value: allows blanks and a comment, then
    /// consumes the line terminator.
    fn finish_line(&mut self) -> Result<(), ParseError> {
        if let Err(e) = self.eat_blanks() {
            return Err(e);
        }
        match self.at_line_end() {
            Ok(true) => return self.skip_line(),
            Ok(false) => {}
            Err(e) => return Err(e),
        }
        let r = match self.peek() {
            Ok(r) => r,
            Err(e) => return Err(e),
        };
        if r.ch == ';' || r.ch == '#' {
            return self.skip_line();
        }
        let start = self.cursor;
        let end = match self.line_end() {
            Ok(end) => end,
            Err(e) => return Err(e),
        };
        Err(self.set_error(start, Some(end), ErrorKind::TrailingCharacters))
    }

    /// Offset of the end of the current line, excluding `\r\n`, `\n` or a
    /// final `\r`.
    /// Does not move the cursor.
    fn line_end(&mut self) -> Result<usize, ParseError> {
        let saved = self.cursor;
        let result = loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => break Err(e),
            };
            if r.is_end() || r.ch == '\n' || self.at_cr_break() {
                break Ok(self.cursor);
            }
            self.advance(r);
        };
        self.cursor = saved;
        result
    }

    // -- scan loop ----------------------------------------------------------

    fn parse_document(&mut self) -> Result<(), ParseError> {
        loop {
            let step = match self.state {
                State::Scanning => match self.scan() {
                    Ok(true) => return Ok(()),
                    Ok(false) => Ok(()),
                    Err(e) => Err(e),
                },
                State::Header => {
                    self.state = State::Scanning;
                    self.process_header()
                }
                State::Field => {
                    self.state = State::Scanning;
                    self.process_field()
                }
            };
            if step.is_err() {
                if self.report() {
                    return Err(ParseError);
                }
                if self.skip_line().is_err() {
                    // Only decoding errors can surface here, and they are fatal.
                    self.report();
                    return Err(ParseError);
                }
            }
        }
    }

    /// Skips blank lines and comments, then picks the state for the next
    /// line. Returns `true` at the end of input.
    fn scan(&mut self) -> Result<bool, ParseError> {
        if let Err(e) = self.eat_blanks() {
            return Err(e);
        }
        let r = match self.peek() {
            Ok(r) => r,
            Err(e) => return Err(e),
        };
        if r.is_end() {
            return Ok(true);
        }
        match r.ch {
            '\n' => self.advance(r),
            '\r' if self.at_cr_break() => self.advance(r),
            '\r' => {
                return Err(self.set_error(self.cursor, None, ErrorKind::Unexpected('\r')));
            }
            ';' | '#' => {
                if let Err(e) = self.skip_line() {
                    return Err(e);
                }
            }
            '[' => self.state = State::Header,
            _ => self.state = State::Field,
        }
        Ok(false)
    }

    fn process_header(&mut self) -> Result<(), ParseError> {
        let header_start = self.cursor;
        // `[`
        self.cursor += 1;
        let content_start = self.cursor;

        let mut in_quotes = false;
        let content_end = loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => return Err(e),
            };
            if r.is_end() || r.ch == '\n' {
                return Err(self.set_error(
                    header_start,
                    Some(self.cursor),
                    ErrorKind::UnterminatedHeader,
                ));
            }
            match r.ch {
                ']' if !in_quotes => break self.cursor,
                '"' => in_quotes = !in_quotes,
                '\\' => {
                    // The escaped rune is validated by the path splitter;
                    // here it only must not close the header.
                    self.advance(r);
                    let escaped = match self.peek() {
                        Ok(r) => r,
                        Err(e) => return Err(e),
                    };
                    if !escaped.is_end() && escaped.ch != '\n' {
                        self.advance(escaped);
                    }
                    continue;
                }
                _ => {}
            }
            self.advance(r);
        };
        // `]`
        self.cursor += 1;
        let header_span = Span::new(header_start as u32, self.cursor as u32);

        let raw = match self.str_slice(content_start, content_end) {
            Ok(s) => s,
            Err(e) => return Err(e),
        };
        let segments = match path::split(raw) {
            Ok(p) => p,
            Err(mut e) => {
                e.span = e.span.shifted(content_start as u32);
                return Err(self.set_error_spanned(e));
            }
        };
        let section = match path::resolve_or_create(self.doc, &segments, header_span) {
            Ok(id) => id,
            Err(mut e) => {
                e.span = header_span;
                return Err(self.set_error_spanned(e));
            }
        };
        self.current = section;

        self.finish_line()
    }

    fn process_field(&mut self) -> Result<(), ParseError> {
        let line_start = self.cursor;

        let key_start = self.cursor;
        loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => return Err(e),
            };
            if r.is_end() || is_blank(r.ch) || matches!(r.ch, '=' | '\n' | '\r') {
                break;
            }
            self.advance(r);
        }
        let key_end = self.cursor;
        if key_start == key_end {
            return Err(self.set_error(key_start, None, ErrorKind::MissingKey));
        }
        let key = match self.str_slice(key_start, key_end) {
            Ok(s) => s,
            Err(e) => return Err(e),
        };

        if let Err(e) = self.eat_blanks() {
            return Err(e);
        }
        let r = match self.peek() {
            Ok(r) => r,
            Err(e) => return Err(e),
        };
        if r.is_end() || r.ch != '=' {
            return Err(self.set_error(key_start, Some(key_end), ErrorKind::MissingEquals));
        }
        self.advance(r);

        let value_start = self.cursor;
        if let Err(e) = self.eat_blanks() {
            return Err(e);
        }
        let r = match self.peek() {
            Ok(r) => r,
            Err(e) => return Err(e),
        };
        if !r.is_end() && r.ch == '"' {
            return self.process_quoted_value(line_start, key);
        }
        if !self.doc.options().trim_values {
            self.cursor = value_start;
        }

        let value_start = self.cursor;
        let value_end = match self.line_end() {
            Ok(end) => end,
            Err(e) => return Err(e),
        };
        let raw = match self.str_slice(value_start, value_end) {
            Ok(s) => s,
            Err(e) => return Err(e),
        };
        let raw = if self.doc.options().trim_values {
            trim_blank(raw)
        } else {
            raw
        };
        let types = ValueTypes::infer(raw, self.doc.options());
        let span = Span::new(line_start as u32, value_end as u32);
        if let Err(e) = self.doc.add_field(self.current, key, raw, types, span) {
            return Err(self.set_error(line_start, Some(value_end), e.kind));
        }
        self.cursor = value_end;
        self.skip_line()
    }

    /// Reads a double-quoted value starting at the cursor. Quoted values are
    /// strings only.
    fn process_quoted_value(&mut self, line_start: usize, key: &'a str) -> Result<(), ParseError> {
        let quote_start = self.cursor;
        // `"`
        self.cursor += 1;
        self.string_buf.clear();
        loop {
            let r = match self.peek() {
                Ok(r) => r,
                Err(e) => return Err(e),
            };
            if r.is_end() || r.ch == '\n' {
                return Err(self.set_error(
                    quote_start,
                    Some(self.cursor),
                    ErrorKind::UnterminatedString,
                ));
            }
            self.advance(r);
            match r.ch {
                '"' => break,
                '\\' => {
                    let escape_start = self.cursor - 1;
                    let esc = match self.peek() {
                        Ok(r) => r,
                        Err(e) => return Err(e),
                    };
                    if esc.is_end() || esc.ch == '\n' {
                        return Err(self.set_error(
                            quote_start,
                            Some(self.cursor),
                            ErrorKind::UnterminatedString,
                        ));
                    }
                    self.advance(esc);
                    let ch = match esc.ch {
                        '"' => '"',
                        '\\' => '\\',
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => {
                            return Err(self.set_error(
                                escape_start,
                                Some(self.cursor),
                                ErrorKind::InvalidEscape(other),
                            ));
                        }
                    };
                    self.string_buf.push(ch);
                }
                ch => self.string_buf.push(ch),
            }
        }
        let span = Span::new(line_start as u32, self.cursor as u32);
        if let Err(e) =
            self.doc
                .add_field(self.current, key, &self.string_buf, ValueTypes::STRING, span)
        {
            return Err(self.set_error(line_start, Some(self.cursor), e.kind));
        }
        self.finish_line()
    }
}

// ---------------------------------------------------------------------------
// Top-level parse entry points
// ---------------------------------------------------------------------------

impl Document {
    /// Parses `source` into this document.
    ///
    /// See [`parse_bytes`](Self::parse_bytes).
    pub fn parse_str(&mut self, source: &str) -> Result<(), Error> {
        self.parse_bytes(source.as_bytes())
    }

    /// Parses UTF-8 `source` into this document.
    ///
    /// Sections and fields are appended to whatever the document already
    /// holds; field lines before the first header go to the root section.
    /// A NUL byte ends the input.
    ///
    /// Syntax errors do not stop the pass: the offending line is skipped and
    /// parsing resumes on the next one. Every error is recorded in
    /// [`diagnostics`](Self::diagnostics) and the first one is returned once
    /// the pass is over. Allocation failures and invalid UTF-8 stop the pass
    /// immediately; whatever was parsed before them stays in the document.
    pub fn parse_bytes(&mut self, source: &[u8]) -> Result<(), Error> {
        if u32::try_from(source.len()).is_err() {
            return Err(ErrorKind::Unsupported("sources of 4 GiB or more").into());
        }

        let mut parser = Parser::new(source, self);
        let _ = parser.parse_document();
        match parser.first_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Reads the whole file at `path` and parses it into this document.
    ///
    /// The file is read before parsing starts, so I/O failures never leave a
    /// partially parsed file behind.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let source = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ErrorKind::FileNotFound(path.to_path_buf()).into());
            }
            Err(e) => return Err(ErrorKind::Io(e.kind()).into()),
        };
        tracing::debug!(path = %path.display(), bytes = source.len(), "loaded source");
        self.parse_bytes(&source)
    }
}

/// Parses an INI string into a new [`Document`] with default options.
///
/// Returns the first error if any line failed to parse. To keep the
/// best-effort result of a source with errors, create a [`Document`] and
/// call [`Document::parse_str`] instead.
pub fn parse(source: &str) -> Result<Document, Error> {
    parse_bytes(source.as_bytes())
}

/// Parses UTF-8 bytes into a new [`Document`] with default options.
pub fn parse_bytes(source: &[u8]) -> Result<Document, Error> {
    let mut doc = match Document::new() {
        Ok(doc) => doc,
        Err(e) => return Err(e),
    };
    match doc.parse_bytes(source) {
        Ok(()) => Ok(doc),
        Err(e) => Err(e),
    }
}

/// Reads and parses the file at `path` into a new [`Document`] with default
/// options.
pub fn from_path(path: impl AsRef<Path>) -> Result<Document, Error> {
    let mut doc = match Document::new() {
        Ok(doc) => doc,
        Err(e) => return Err(e),
    };
    match doc.parse_file(path) {
        Ok(()) => Ok(doc),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;
