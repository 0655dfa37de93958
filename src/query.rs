//! String queries of the form `<section path>:<key>`.
//!
//! The section part is split exactly like a header, so `a.b:key`,
//! `a b:key` and `"a".b:key` all name the same field. A query without `:`
//! looks the key up in the root section. Lookups are read-only and report
//! misses immediately.

use crate::document::{Document, Field, Section};
use crate::error::{Error, ErrorKind};
use crate::path;
use crate::value::{ArrayItems, ValueType};

#[cfg(test)]
#[path = "./query_tests.rs"]
mod tests;

/// Splits a query at its last `:` into section path and key.
fn split_query(query: &str) -> Result<(&str, &str), Error> {
    let (section, key) = match query.rsplit_once(':') {
        Some(parts) => parts,
        None => ("", query),
    };
    if key.is_empty() {
        return Err(ErrorKind::InvalidArgument("query has an empty key").into());
    }
    Ok((section, key))
}

impl Document {
    /// Finds the section at `section_path`. An empty or all-space path is the root.
    pub fn find_section(&self, section_path: &str) -> Result<Section<'_>, Error> {
        if section_path.trim_matches(' ').is_empty() {
            return Ok(self.root());
        }
        let segments = match path::split(section_path) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };
        match path::resolve(self, &segments) {
            Some(id) => Ok(self.section(id)),
            None => Err(ErrorKind::SectionNotFound(section_path.to_string()).into()),
        }
    }

    /// Finds the field named by `query`.
    ///
    /// When a key repeats within its section the last occurrence is returned.
    pub fn field(&self, query: &str) -> Result<Field<'_>, Error> {
        let (section, key) = match split_query(query) {
            Ok(parts) => parts,
            Err(e) => return Err(e),
        };
        let section = match self.find_section(section) {
            Ok(s) => s,
            Err(e) => return Err(e),
        };
        match section.get(key) {
            Some(field) => Ok(field),
            None => Err(ErrorKind::KeyNotFound(key.to_string()).into()),
        }
    }

    fn typed_field(&self, query: &str, expected: ValueType) -> Result<Field<'_>, Error> {
        match self.field(query) {
            Ok(field) if field.is(expected) => Ok(field),
            Ok(_) => Err(ErrorKind::TypeMismatch { expected }.into()),
            Err(e) => Err(e),
        }
    }

    /// The raw text of the field named by `query`.
    pub fn get_text(&self, query: &str) -> Result<&str, Error> {
        match self.field(query) {
            Ok(field) => Ok(field.value()),
            Err(e) => Err(e),
        }
    }

    /// The value of the field named by `query` as an integer.
    ///
    /// ```
    /// let doc = cini::parse("[limits]\nmax = 12\nname = twelve\n")?;
    /// assert_eq!(doc.get_int("limits:max")?, 12);
    /// assert!(doc.get_int("limits:name").is_err());
    /// # Ok::<(), cini::Error>(())
    /// ```
    pub fn get_int(&self, query: &str) -> Result<i64, Error> {
        let field = match self.typed_field(query, ValueType::Integer) {
            Ok(f) => f,
            Err(e) => return Err(e),
        };
        match field.as_integer() {
            Some(n) => Ok(n),
            None => Err(ErrorKind::Internal("integer flag on non-integer text").into()),
        }
    }

    /// The value of the field named by `query` as a floating-point number.
    pub fn get_decimal(&self, query: &str) -> Result<f64, Error> {
        let field = match self.typed_field(query, ValueType::Decimal) {
            Ok(f) => f,
            Err(e) => return Err(e),
        };
        match field.as_decimal() {
            Some(n) => Ok(n),
            None => Err(ErrorKind::Internal("decimal flag on non-decimal text").into()),
        }
    }

    /// The value of the field named by `query` as a boolean.
    pub fn get_bool(&self, query: &str) -> Result<bool, Error> {
        let field = match self.typed_field(query, ValueType::Boolean) {
            Ok(f) => f,
            Err(e) => return Err(e),
        };
        match field.as_bool() {
            Some(b) => Ok(b),
            None => Err(ErrorKind::Internal("boolean flag on non-boolean text").into()),
        }
    }

    /// The items of the array field named by `query`.
    pub fn get_array(&self, query: &str) -> Result<ArrayItems<'_>, Error> {
        let field = match self.typed_field(query, ValueType::Array) {
            Ok(f) => f,
            Err(e) => return Err(e),
        };
        match field.as_array() {
            Some(items) => Ok(items),
            None => Err(ErrorKind::Internal("array flag on non-array text").into()),
        }
    }

    /// Number of sections, or of direct sub-sections of `super_section`.
    ///
    /// `None` counts every section in the document except the root.
    pub fn count_sections(&self, super_section: Option<&str>) -> Result<usize, Error> {
        match super_section {
            None => Ok(self.section_count()),
            Some(path) => match self.find_section(path) {
                Ok(section) => Ok(section.child_count()),
                Err(e) => Err(e),
            },
        }
    }

    /// Full dotted name of the `index`th section.
    ///
    /// With `None` the index runs over every section in creation order;
    /// otherwise over the direct sub-sections of `super_section`.
    ///
    /// ```
    /// let doc = cini::parse("[net.http]\n[net.dns]\n")?;
    /// assert_eq!(doc.section_name(None, 2)?, "net.dns");
    /// assert_eq!(doc.section_name(Some("net"), 0)?, "net.http");
    /// # Ok::<(), cini::Error>(())
    /// ```
    pub fn section_name(&self, super_section: Option<&str>, index: usize) -> Result<String, Error> {
        let id = match super_section {
            None => match self.section_at(index) {
                Some(section) => Ok(section.id()),
                None => Err(self.section_count()),
            },
            Some(path) => {
                let parent = match self.find_section(path) {
                    Ok(s) => s,
                    Err(e) => return Err(e),
                };
                match parent.children().nth(index) {
                    Some(section) => Ok(section.id()),
                    None => Err(parent.child_count()),
                }
            }
        };
        match id {
            Ok(id) => Ok(self.full_name(id)),
            Err(len) => Err(ErrorKind::IndexOutOfRange { index, len }.into()),
        }
    }
}
