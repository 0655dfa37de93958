//! Section path splitting and resolution.
//!
//! A section path is the text between a header's brackets, or the part of a
//! query before its `:`. Segments are separated by a single `.` or by a run
//! of spaces; each separator descends exactly one level.

use crate::document::{Document, SectionId};
use crate::error::{Error, ErrorKind};
use crate::Span;
use std::borrow::Cow;

#[cfg(test)]
#[path = "./path_tests.rs"]
mod tests;

/// The segments of a section path, outermost first.
///
/// Segments borrow from the source unless they contained escapes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SectionPath<'a> {
    segments: Vec<Cow<'a, str>>,
}

impl<'a> SectionPath<'a> {
    /// The segments, outermost first.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.segments.iter().map(|s| &**s)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the empty path, which names the root section.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Splits a raw header into its segments.
///
/// Leading and trailing spaces are ignored. A segment may be written in
/// double quotes to embed `.`, spaces or `]`; inside quotes `\"` and `\\`
/// are escapes. Outside quotes a backslash escapes one of `.`, space, `"`,
/// `\`, `[` or `]`.
///
/// Error spans are byte offsets into `raw`.
///
/// ```
/// let path = cini::split_path("a.b  c")?;
/// assert_eq!(path.segments().collect::<Vec<_>>(), ["a", "b", "c"]);
/// # Ok::<(), cini::Error>(())
/// ```
pub fn split(raw: &str) -> Result<SectionPath<'_>, Error> {
    let mut splitter = Splitter {
        raw,
        cursor: 0,
        buf: String::new(),
    };
    splitter.split()
}

struct Splitter<'a> {
    raw: &'a str,
    cursor: usize,
    buf: String,
}

impl<'a> Splitter<'a> {
    fn error(&self, start: usize, end: usize, kind: ErrorKind) -> Error {
        Error::from((kind, Span::new(start as u32, end as u32)))
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.raw[self.cursor..].chars().next()
    }

    fn eat_spaces(&mut self) -> bool {
        let start = self.cursor;
        while self.peek() == Some(' ') {
            self.cursor += 1;
        }
        self.cursor > start
    }

    fn split(&mut self) -> Result<SectionPath<'a>, Error> {
        self.eat_spaces();
        if self.cursor == self.raw.len() {
            return Err(self.error(0, self.raw.len(), ErrorKind::EmptyHeader));
        }

        let mut segments = Vec::new();
        loop {
            let segment = match self.segment() {
                Ok(s) => s,
                Err(e) => return Err(e),
            };
            segments.push(segment);

            let delim = self.cursor;
            match self.peek() {
                None => break,
                Some('.') => self.cursor += 1,
                Some(' ') => {
                    self.eat_spaces();
                    if self.cursor == self.raw.len() {
                        break;
                    }
                }
                Some(c) => {
                    return Err(self.error(
                        delim,
                        delim + c.len_utf8(),
                        ErrorKind::Unexpected(c),
                    ));
                }
            }
            if self.cursor == self.raw.len() {
                return Err(self.error(delim, self.cursor, ErrorKind::EmptySegment));
            }
        }
        Ok(SectionPath { segments })
    }

    fn segment(&mut self) -> Result<Cow<'a, str>, Error> {
        match self.peek() {
            Some('"') => self.quoted_segment(),
            Some('.' | ' ') | None => {
                Err(self.error(self.cursor, self.cursor + 1, ErrorKind::EmptySegment))
            }
            Some(_) => self.bare_segment(),
        }
    }

    fn bare_segment(&mut self) -> Result<Cow<'a, str>, Error> {
        let start = self.cursor;
        let mut escaped = false;
        self.buf.clear();
        while let Some(c) = self.peek() {
            match c {
                '.' | ' ' => break,
                '"' => {
                    let at = self.cursor;
                    return Err(self.error(at, at + 1, ErrorKind::Unexpected('"')));
                }
                '\\' => {
                    if !escaped {
                        escaped = true;
                        self.buf.push_str(&self.raw[start..self.cursor]);
                    }
                    let at = self.cursor;
                    self.cursor += 1;
                    match self.peek() {
                        Some(e @ ('.' | ' ' | '"' | '\\' | '[' | ']')) => {
                            self.buf.push(e);
                            self.cursor += 1;
                        }
                        Some(e) => {
                            return Err(self.error(
                                at,
                                self.cursor + e.len_utf8(),
                                ErrorKind::InvalidEscape(e),
                            ));
                        }
                        None => {
                            let end = self.cursor;
                            return Err(self.error(at, end, ErrorKind::InvalidEscape('\\')));
                        }
                    }
                }
                c => {
                    if escaped {
                        self.buf.push(c);
                    }
                    self.cursor += c.len_utf8();
                }
            }
        }
        if escaped {
            Ok(Cow::Owned(std::mem::take(&mut self.buf)))
        } else {
            let raw = self.raw;
            Ok(Cow::Borrowed(&raw[start..self.cursor]))
        }
    }

    fn quoted_segment(&mut self) -> Result<Cow<'a, str>, Error> {
        let open = self.cursor;
        self.cursor += 1;
        let content_start = self.cursor;
        let mut escaped = false;
        self.buf.clear();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(open, self.cursor, ErrorKind::UnterminatedQuote));
            };
            match c {
                '"' => break,
                '\\' => {
                    if !escaped {
                        escaped = true;
                        self.buf.push_str(&self.raw[content_start..self.cursor]);
                    }
                    let at = self.cursor;
                    self.cursor += 1;
                    match self.peek() {
                        Some(e @ ('"' | '\\')) => {
                            self.buf.push(e);
                            self.cursor += 1;
                        }
                        Some(e) => {
                            return Err(self.error(
                                at,
                                self.cursor + e.len_utf8(),
                                ErrorKind::InvalidEscape(e),
                            ));
                        }
                        None => {
                            return Err(self.error(open, self.cursor, ErrorKind::UnterminatedQuote));
                        }
                    }
                }
                c => {
                    if escaped {
                        self.buf.push(c);
                    }
                    self.cursor += c.len_utf8();
                }
            }
        }
        let content_end = self.cursor;
        self.cursor += 1;

        if content_end == content_start {
            return Err(self.error(open, self.cursor, ErrorKind::EmptySegment));
        }
        if escaped {
            Ok(Cow::Owned(std::mem::take(&mut self.buf)))
        } else {
            let raw = self.raw;
            Ok(Cow::Borrowed(&raw[content_start..content_end]))
        }
    }
}

/// Walks `path` from the root without creating anything.
///
/// Returns `None` at the first segment with no matching child. The empty
/// path resolves to the root.
pub fn resolve(doc: &Document, path: &SectionPath<'_>) -> Option<SectionId> {
    let mut current = SectionId::ROOT;
    for segment in path.segments() {
        current = doc.find_child(current, segment)?;
    }
    Some(current)
}

/// Walks `path` from the root, reusing existing sections and creating the
/// missing suffix.
///
/// Matching stops at the first segment without a child of that name; from
/// there on every remaining segment is created, so writing `[a.b.c]` alone
/// creates `a`, `a.b` and `a.b.c`. Created sections record `span` as their
/// origin.
pub fn resolve_or_create(
    doc: &mut Document,
    path: &SectionPath<'_>,
    span: Span,
) -> Result<SectionId, Error> {
    let mut current = SectionId::ROOT;
    let mut segments = path.segments();
    for segment in segments.by_ref() {
        match doc.find_child(current, segment) {
            Some(child) => current = child,
            None => {
                current = match doc.add_child(current, segment, span) {
                    Ok(id) => id,
                    Err(e) => return Err(e),
                };
                tracing::debug!(section = %doc.full_name(current), "created section");
                break;
            }
        }
    }
    for segment in segments {
        current = match doc.add_child(current, segment, span) {
            Ok(id) => id,
            Err(e) => return Err(e),
        };
        tracing::debug!(section = %doc.full_name(current), "created section");
    }
    Ok(current)
}
