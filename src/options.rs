//! Parser and document configuration.

use crate::arena::DEFAULT_CAPACITY;

/// How boolean literals are matched.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum BooleanCase {
    /// Only `true` and `false`.
    #[default]
    Exact,
    /// `true` and `false` in any ASCII case, e.g. `TRUE` or `False`.
    Insensitive,
}

/// Settings fixed at [`Document`](crate::Document) construction.
///
/// Keys and section names are always compared exactly; there is no option
/// for case folding.
///
/// # Examples
///
/// ```
/// use cini::{BooleanCase, Document, Options};
///
/// let options = Options::default()
///     .boolean_case(BooleanCase::Insensitive)
///     .trim_values(false);
/// let mut doc = Document::with_options(options)?;
/// doc.parse_str("[flags]\nverbose=TRUE\n")?;
/// assert_eq!(doc.get_bool("flags:verbose")?, true);
/// # Ok::<(), cini::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Size in bytes of the arena's first block.
    pub initial_capacity: usize,
    /// Upper bound on the bytes the arena may reserve, or `None` for no bound.
    pub memory_limit: Option<usize>,
    /// Strip spaces and tabs around raw values.
    pub trim_values: bool,
    /// Matching policy for `true`/`false`.
    pub boolean_case: BooleanCase,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            memory_limit: None,
            trim_values: true,
            boolean_case: BooleanCase::Exact,
        }
    }
}

impl Options {
    /// Sets [`initial_capacity`](Self::initial_capacity).
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Sets [`memory_limit`](Self::memory_limit).
    pub fn memory_limit(mut self, bytes: Option<usize>) -> Self {
        self.memory_limit = bytes;
        self
    }

    /// Sets [`trim_values`](Self::trim_values).
    pub fn trim_values(mut self, trim: bool) -> Self {
        self.trim_values = trim;
        self
    }

    /// Sets [`boolean_case`](Self::boolean_case).
    pub fn boolean_case(mut self, case: BooleanCase) -> Self {
        self.boolean_case = case;
        self
    }
}
