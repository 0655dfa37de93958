//! A parser for INI documents with hierarchical section paths.
//!
//! Section headers name a path through a tree: `[server.http]`,
//! `[server http]` and `["server".http]` all address the section `http`
//! nested in `server`, creating any missing ancestors on the way. Every
//! string and child list of a [`Document`] lives in one bump [`Arena`] that
//! is released as a whole when the document is dropped.
//!
//! Values keep their raw text. Each one also records the set of
//! [`ValueType`]s it can be read as, which the typed accessors check.
//!
//! # Examples
//!
//! ```
//! use cini::{Error, ValueType};
//!
//! let content = r#"
//! ; global settings
//! name = demo
//!
//! [server.http]
//! port = 8080
//! hosts = [alpha, beta]
//!
//! [server tls]
//! enabled = true
//! cert = "/etc/ssl/demo.pem"
//! "#;
//!
//! let doc = cini::parse(content)?;
//!
//! assert_eq!(doc.get_text("name")?, "demo");
//! assert_eq!(doc.get_int("server.http:port")?, 8080);
//! assert!(doc.get_bool("server.tls:enabled")?);
//! assert_eq!(doc.get_array("server.http:hosts")?.collect::<Vec<_>>(), ["alpha", "beta"]);
//!
//! let server = doc.root().child("server").unwrap();
//! assert_eq!(server.child_count(), 2);
//!
//! let port = doc.field("server.http:port")?;
//! assert!(port.is(ValueType::Integer) && port.is(ValueType::Decimal));
//! # Ok::<(), Error>(())
//! ```
//!
//! # Errors
//!
//! Parsing is best-effort. A malformed line is skipped and recorded, and the
//! pass continues with the next one; the first error is returned at the end.
//! [`Document::diagnostics`] lists all of them:
//!
//! ```
//! use cini::{Document, ErrorKind};
//!
//! let mut doc = Document::new()?;
//! let err = doc.parse_str("[a\nkey = 1\n[b]\nbroken\n").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::UnterminatedHeader);
//! assert_eq!(doc.diagnostics().len(), 2);
//! assert_eq!(doc.get_int("key")?, 1);
//! # Ok::<(), cini::Error>(())
//! ```

mod arena;
mod document;
mod error;
mod options;
mod parser;
mod path;
mod query;
mod rune;
mod span;
mod str;
mod value;

pub use arena::{Arena, DEFAULT_CAPACITY};
pub use document::{Document, Field, FieldId, Fields, Section, SectionId};
pub use error::{Error, ErrorKind};
pub use options::{BooleanCase, Options};
pub use parser::{from_path, parse, parse_bytes};
pub use path::{SectionPath, resolve, resolve_or_create, split as split_path};
pub use rune::{DecodeError, Rune, decode};
pub use span::Span;
pub use value::{ArrayItems, ValueType, ValueTypes};
