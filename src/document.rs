#![allow(unsafe_code)]

//! The in-memory section tree.
//!
//! Sections and fields live in two index-addressed tables owned by the
//! [`Document`]; every string they reference, and every child list, lives in
//! the document's [`Arena`]. Handles ([`SectionId`], [`FieldId`]) are plain
//! indices, and the borrowed views [`Section`] and [`Field`] tie the arena
//! data to a borrow of the document.

use crate::arena::Arena;
use crate::error::{Error, ErrorKind};
use crate::options::Options;
use crate::str::ArenaStr;
use crate::value::{self, ArrayItems, ValueType, ValueTypes};
use crate::Span;
use std::alloc::Layout;
use std::collections::HashMap;
use std::ptr::NonNull;

#[cfg(test)]
#[path = "./document_tests.rs"]
mod tests;

/// Sections with at least this many children use the hash index for lookups.
const INDEXED_CHILDREN_THRESHOLD: usize = 6;

/// Initial capacity of a child list.
const MIN_CHILDREN: u32 = 4;

/// Handle to a section of a [`Document`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SectionId(u32);

impl SectionId {
    /// The synthetic root section that holds fields written before any header.
    pub const ROOT: SectionId = SectionId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a field of a [`Document`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FieldId(u32);

impl FieldId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A growable array of child handles stored in the arena.
///
/// Starts at four entries and doubles on overflow. Outgrown buffers are
/// abandoned in the arena.
struct ChildList {
    len: u32,
    cap: u32,
    ptr: NonNull<SectionId>,
}

impl ChildList {
    const fn new() -> Self {
        Self {
            len: 0,
            cap: 0,
            ptr: NonNull::dangling(),
        }
    }

    fn push(&mut self, id: SectionId, arena: &Arena) -> Result<(), Error> {
        if self.len == self.cap {
            if let Err(e) = self.grow(arena) {
                return Err(e);
            }
        }
        // Safety: len < cap after growing.
        unsafe { self.ptr.as_ptr().add(self.len as usize).write(id) };
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self, arena: &Arena) -> Result<(), Error> {
        let new_cap = if self.cap == 0 {
            MIN_CHILDREN
        } else {
            match self.cap.checked_mul(2) {
                Some(cap) => cap,
                None => return Err(ErrorKind::Internal("child list overflow").into()),
            }
        };
        let elem = std::mem::size_of::<SectionId>();
        let align = std::mem::align_of::<SectionId>();
        let new_size = new_cap as usize * elem;
        let result = if self.cap > 0 {
            // Safety: ptr was returned by a prior arena alloc of cap elements.
            unsafe { arena.realloc(self.ptr.cast(), self.cap as usize * elem, new_size, align) }
        } else {
            match Layout::from_size_align(new_size, align) {
                Ok(layout) => arena.alloc_layout(layout),
                Err(_) => Err(ErrorKind::AllocationFailure { requested: new_size }.into()),
            }
        };
        match result {
            Ok(ptr) => {
                self.ptr = ptr.cast();
                self.cap = new_cap;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[inline]
    fn as_slice(&self) -> &[SectionId] {
        if self.len == 0 {
            &[]
        } else {
            // Safety: the first len entries were written by push.
            unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len as usize) }
        }
    }
}

// SAFETY: the list points into an arena owned by the same document.
unsafe impl Send for ChildList {}
unsafe impl Sync for ChildList {}

pub(crate) struct SectionData {
    name: ArenaStr,
    parent: Option<SectionId>,
    span: Span,
    children: ChildList,
    first_field: Option<FieldId>,
    last_field: Option<FieldId>,
    num_fields: u32,
}

pub(crate) struct FieldData {
    key: ArenaStr,
    value: ArenaStr,
    types: ValueTypes,
    span: Span,
    next: Option<FieldId>,
}

/// Hash-map key that identifies a (parent, child-name) pair without owning
/// the name.
#[derive(PartialEq, Eq, Hash)]
struct ChildKey {
    parent: u32,
    name: ArenaStr,
}

/// A parsed INI document.
///
/// The document owns one arena and one section tree. Parsing only ever
/// appends: sections and fields are never removed, and all their memory is
/// released together when the document is dropped.
///
/// # Examples
///
/// ```
/// let doc = cini::parse("[server.http]\nport = 8080\n")?;
/// assert_eq!(doc.get_int("server.http:port")?, 8080);
/// assert_eq!(doc.section_count(), 2);
/// # Ok::<(), cini::Error>(())
/// ```
pub struct Document {
    // Declared before the arena so no handle outlives the memory behind it.
    sections: Vec<SectionData>,
    fields: Vec<FieldData>,
    child_index: foldhash::HashMap<ChildKey, SectionId>,
    diagnostics: Vec<Error>,
    options: Options,
    arena: Arena,
}

impl Document {
    /// Creates an empty document with default [`Options`].
    pub fn new() -> Result<Self, Error> {
        Self::with_options(Options::default())
    }

    /// Creates an empty document.
    pub fn with_options(options: Options) -> Result<Self, Error> {
        let arena = match Arena::with_limit(options.initial_capacity, options.memory_limit) {
            Ok(a) => a,
            Err(e) => return Err(e),
        };
        let root = SectionData {
            name: ArenaStr::EMPTY,
            parent: None,
            span: Span::default(),
            children: ChildList::new(),
            first_field: None,
            last_field: None,
            num_fields: 0,
        };
        Ok(Self {
            sections: vec![root],
            fields: Vec::new(),
            child_index: HashMap::default(),
            diagnostics: Vec::new(),
            options,
            arena,
        })
    }

    /// The options the document was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The arena backing every string in the document.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Every error reported while parsing into this document, in order.
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub(crate) fn push_diagnostic(&mut self, error: Error) {
        self.diagnostics.push(error);
    }

    /// Discards every section, field and diagnostic, keeping the options.
    ///
    /// The arena is replaced, so all memory from earlier parses is released.
    pub fn reset(&mut self) -> Result<(), Error> {
        let fresh = match Document::with_options(self.options.clone()) {
            Ok(doc) => doc,
            Err(e) => return Err(e),
        };
        *self = fresh;
        tracing::debug!("document reset");
        Ok(())
    }

    /// Number of sections, not counting the root.
    pub fn section_count(&self) -> usize {
        self.sections.len() - 1
    }

    /// Number of fields across all sections.
    pub fn value_count(&self) -> usize {
        self.fields.len()
    }

    /// The synthetic root section.
    pub fn root(&self) -> Section<'_> {
        self.section(SectionId::ROOT)
    }

    /// Returns a view of the section behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document with more sections.
    pub fn section(&self, id: SectionId) -> Section<'_> {
        Section {
            doc: self,
            id,
            data: &self.sections[id.index()],
        }
    }

    /// Returns a view of the field behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another document with more fields.
    pub fn field_by_id(&self, id: FieldId) -> Field<'_> {
        Field {
            id,
            data: &self.fields[id.index()],
        }
    }

    /// All sections except the root, in the order they were created.
    ///
    /// Implicitly created ancestors appear right before the section whose
    /// header created them.
    pub fn sections(&self) -> impl ExactSizeIterator<Item = Section<'_>> + '_ {
        (1..self.sections.len()).map(move |i| self.section(SectionId(i as u32)))
    }

    /// Returns the `index`th section in creation order, not counting the root.
    pub fn section_at(&self, index: usize) -> Option<Section<'_>> {
        if index < self.section_count() {
            Some(self.section(SectionId(index as u32 + 1)))
        } else {
            None
        }
    }

    /// Finds the direct child of `parent` called `name`. Names are compared
    /// exactly.
    pub fn find_child(&self, parent: SectionId, name: &str) -> Option<SectionId> {
        let children = self.sections[parent.index()].children.as_slice();
        if children.len() >= INDEXED_CHILDREN_THRESHOLD {
            let key = ChildKey {
                parent: parent.0,
                name: ArenaStr::new(name),
            };
            return self.child_index.get(&key).copied();
        }
        children
            .iter()
            .copied()
            .find(|child| unsafe { self.sections[child.index()].name.as_str() } == name)
    }

    /// Appends a new child called `name` to `parent`.
    ///
    /// Does **not** check for an existing child of the same name; callers
    /// that need find-or-create semantics use [`find_child`](Self::find_child)
    /// first.
    pub fn add_child(
        &mut self,
        parent: SectionId,
        name: &str,
        span: Span,
    ) -> Result<SectionId, Error> {
        let Ok(index) = u32::try_from(self.sections.len()) else {
            return Err(ErrorKind::Internal("too many sections").into());
        };
        let name = match self.arena.alloc_str(name) {
            Ok(s) => ArenaStr::new(s),
            Err(e) => return Err(e),
        };
        let id = SectionId(index);

        let parent_data = &mut self.sections[parent.index()];
        if let Err(e) = parent_data.children.push(id, &self.arena) {
            return Err(e);
        }
        let num_children = parent_data.children.len as usize;

        self.sections.push(SectionData {
            name,
            parent: Some(parent),
            span,
            children: ChildList::new(),
            first_field: None,
            last_field: None,
            num_fields: 0,
        });

        if num_children == INDEXED_CHILDREN_THRESHOLD {
            self.bulk_index_children(parent);
        } else if num_children > INDEXED_CHILDREN_THRESHOLD {
            self.child_index.insert(
                ChildKey {
                    parent: parent.0,
                    name,
                },
                id,
            );
        }
        Ok(id)
    }

    fn bulk_index_children(&mut self, parent: SectionId) {
        for &child in self.sections[parent.index()].children.as_slice() {
            let key = ChildKey {
                parent: parent.0,
                name: self.sections[child.index()].name,
            };
            // Sibling names are unique, so the first entry is the only one.
            self.child_index.entry(key).or_insert(child);
        }
    }

    /// Appends a field to `section`. Raw text is copied into the arena.
    pub fn add_field(
        &mut self,
        section: SectionId,
        key: &str,
        value: &str,
        types: ValueTypes,
        span: Span,
    ) -> Result<FieldId, Error> {
        let Ok(index) = u32::try_from(self.fields.len()) else {
            return Err(ErrorKind::Internal("too many fields").into());
        };
        let key = match self.arena.alloc_str(key) {
            Ok(s) => ArenaStr::new(s),
            Err(e) => return Err(e),
        };
        let value = match self.arena.alloc_str(value) {
            Ok(s) => ArenaStr::new(s),
            Err(e) => return Err(e),
        };
        let id = FieldId(index);
        self.fields.push(FieldData {
            key,
            value,
            types,
            span,
            next: None,
        });

        let data = &mut self.sections[section.index()];
        match data.last_field {
            Some(last) => self.fields[last.index()].next = Some(id),
            None => data.first_field = Some(id),
        }
        data.last_field = Some(id);
        data.num_fields += 1;
        Ok(id)
    }

    /// Full dotted name of a section, e.g. `a.b.c`. Empty for the root.
    ///
    /// Separators and quotes inside a segment are backslash-escaped, so the
    /// result splits back into the same segments: `["a.b"]` is `a\.b`.
    pub fn full_name(&self, id: SectionId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(section) = current {
            let data = &self.sections[section.index()];
            if data.parent.is_some() {
                parts.push(unsafe { data.name.as_str() });
            }
            current = data.parent;
        }
        let mut name = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
        for (i, part) in parts.iter().rev().enumerate() {
            if i > 0 {
                name.push('.');
            }
            for c in part.chars() {
                if matches!(c, '.' | ' ' | '"' | '\\' | '[' | ']') {
                    name.push('\\');
                }
                name.push(c);
            }
        }
        name
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// A borrowed view of one section.
#[derive(Copy, Clone)]
pub struct Section<'a> {
    doc: &'a Document,
    id: SectionId,
    data: &'a SectionData,
}

impl<'a> Section<'a> {
    /// The handle of this section.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// The last path segment, e.g. `c` for `[a.b.c]`. Empty for the root.
    pub fn name(&self) -> &'a str {
        // Safety: the name lives in the arena of `doc`, borrowed for 'a.
        unsafe { self.data.name.as_str() }
    }

    /// The full dotted path of the section.
    pub fn full_name(&self) -> String {
        self.doc.full_name(self.id)
    }

    /// Returns `true` for the synthetic root section.
    pub fn is_root(&self) -> bool {
        self.data.parent.is_none()
    }

    /// Span of the header that created the section. Empty for the root.
    pub fn span(&self) -> Span {
        self.data.span
    }

    /// The enclosing section, `None` for the root.
    pub fn parent(&self) -> Option<Section<'a>> {
        self.data.parent.map(|p| self.doc.section(p))
    }

    /// Direct children in creation order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Section<'a>> + use<'a> {
        let doc = self.doc;
        self.data
            .children
            .as_slice()
            .iter()
            .map(move |&id| doc.section(id))
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.data.children.len as usize
    }

    /// The direct child called `name`.
    pub fn child(&self, name: &str) -> Option<Section<'a>> {
        self.doc.find_child(self.id, name).map(|id| self.doc.section(id))
    }

    /// Fields in the order they were written, duplicates included.
    pub fn fields(&self) -> Fields<'a> {
        Fields {
            doc: self.doc,
            next: self.data.first_field,
            remaining: self.data.num_fields as usize,
        }
    }

    /// Number of fields, duplicates included.
    pub fn field_count(&self) -> usize {
        self.data.num_fields as usize
    }

    /// The last field called `key`.
    ///
    /// Keys may repeat within a section; the last occurrence wins. Use
    /// [`get_all`](Self::get_all) to see every occurrence.
    pub fn get(&self, key: &str) -> Option<Field<'a>> {
        self.fields().filter(|f| f.key() == key).last()
    }

    /// Every field called `key`, in order.
    pub fn get_all<'k>(&self, key: &'k str) -> impl Iterator<Item = Field<'a>> + use<'a, 'k> {
        self.fields().filter(move |f| f.key() == key)
    }
}

impl std::fmt::Debug for Section<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Section");
        s.field("name", &self.name());
        if self.data.num_fields > 0 {
            s.field("fields", &self.fields().collect::<Vec<_>>());
        }
        if self.child_count() > 0 {
            s.field("children", &self.children().collect::<Vec<_>>());
        }
        s.finish()
    }
}

/// Iterator over the fields of a section.
#[derive(Clone)]
pub struct Fields<'a> {
    doc: &'a Document,
    next: Option<FieldId>,
    remaining: usize,
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        let id = self.next?;
        let field = self.doc.field_by_id(id);
        self.next = field.data.next;
        self.remaining -= 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Fields<'_> {}

/// A borrowed view of one key/value field.
#[derive(Copy, Clone)]
pub struct Field<'a> {
    id: FieldId,
    data: &'a FieldData,
}

impl<'a> Field<'a> {
    /// The handle of this field.
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The key, exactly as written.
    pub fn key(&self) -> &'a str {
        // Safety: the key lives in the arena of the document borrowed for 'a.
        unsafe { self.data.key.as_str() }
    }

    /// The raw value text.
    pub fn value(&self) -> &'a str {
        // Safety: as for `key`.
        unsafe { self.data.value.as_str() }
    }

    /// Every type the raw value can be read as.
    pub fn types(&self) -> ValueTypes {
        self.data.types
    }

    /// Returns `true` if the value can be read as `ty`.
    pub fn is(&self, ty: ValueType) -> bool {
        self.data.types.contains(ty)
    }

    /// Span of the whole field line, key through value.
    pub fn span(&self) -> Span {
        self.data.span
    }

    /// The value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if self.is(ValueType::Integer) {
            value::parse_integer(self.value())
        } else {
            None
        }
    }

    /// The value as a floating-point number.
    pub fn as_decimal(&self) -> Option<f64> {
        if self.is(ValueType::Decimal) {
            value::parse_decimal(self.value())
        } else {
            None
        }
    }

    /// The value as a boolean.
    ///
    /// Boolean eligibility was decided at parse time under the document's
    /// case policy, so any ASCII case is accepted here.
    pub fn as_bool(&self) -> Option<bool> {
        if self.is(ValueType::Boolean) {
            value::parse_bool(self.value(), crate::BooleanCase::Insensitive)
        } else {
            None
        }
    }

    /// The items of an array value.
    pub fn as_array(&self) -> Option<ArrayItems<'a>> {
        if self.is(ValueType::Array) {
            ArrayItems::new(self.value())
        } else {
            None
        }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key())
            .field("value", &self.value())
            .field("types", &self.types())
            .finish()
    }
}
