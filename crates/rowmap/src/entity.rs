//! Entity descriptors and the per-call field index.
//!
//! `#[derive(Entity)]` emits a static [`FieldMeta`] table plus `get`/`set`
//! accessors keyed by field identifier. The engine never inspects a struct
//! any other way.

use crate::ident::resolve_column;
use crate::value::{Value, ValueError};
use std::borrow::Cow;
use std::collections::HashMap;

/// Storage kind of a field, as seen by the SQL synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
    /// Sequences, maps and `Json<T>`; stored JSON-encoded.
    Json,
    /// Boxed or shared fields. Read from rows but never written.
    Reference,
    Other,
}

/// Static description of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field identifier.
    pub name: &'static str,
    /// Explicit column name, if annotated.
    pub column: Option<&'static str>,
    pub kind: FieldKind,
    /// Marked with `#[orm(id)]`.
    pub primary: bool,
    /// Literal used by [`bind_default`](crate::util::bind_default).
    pub default: Option<&'static str>,
}

impl FieldMeta {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: None,
            kind,
            primary: false,
            default: None,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub const fn default_value(mut self, literal: &'static str) -> Self {
        self.default = Some(literal);
        self
    }
}

/// A struct mapped to table rows.
///
/// Normally derived:
///
/// ```ignore
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     name: String,
///     #[orm(column = "mail")]
///     email: String,
/// }
/// ```
pub trait Entity: Default {
    /// Rust type name; snake-cased into the default table name.
    const TYPE_NAME: &'static str;

    /// Table name override. `None` or an empty name falls back to the type name.
    fn table_name() -> Option<Cow<'static, str>> {
        None
    }

    /// Fields in declaration order.
    fn fields() -> &'static [FieldMeta];

    /// Read a field as a [`Value`]. `None` for unknown and reference fields.
    fn get(&self, field: &str) -> Option<Value>;

    /// Assign a field from a [`Value`].
    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError>;
}

/// One field with its resolved column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedField {
    pub meta: &'static FieldMeta,
    pub column: String,
    /// Qualifies as a primary key: annotated, or its column is `id`.
    pub primary: bool,
}

impl IndexedField {
    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    pub fn kind(&self) -> FieldKind {
        self.meta.kind
    }
}

/// Column ↔ field association for one entity type.
///
/// Built fresh for every operation; nothing is cached.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    entries: Vec<IndexedField>,
    by_column: HashMap<String, usize>,
    primary: Option<usize>,
}

impl FieldIndex {
    pub fn build<T: Entity>() -> Self {
        let fields = T::fields();
        let mut entries = Vec::with_capacity(fields.len());
        let mut by_column = HashMap::with_capacity(fields.len());
        let mut primary = None;

        for (pos, meta) in fields.iter().enumerate() {
            let column = resolve_column(meta);
            let is_primary = meta.primary || column == "id";
            if is_primary && primary.is_none() {
                primary = Some(pos);
            }
            // Colliding columns are not reported; the later field wins.
            by_column.insert(column.clone(), pos);
            entries.push(IndexedField {
                meta,
                column,
                primary: is_primary,
            });
        }

        Self {
            entries,
            by_column,
            primary,
        }
    }

    /// All fields in declaration order.
    pub fn entries(&self) -> &[IndexedField] {
        &self.entries
    }

    /// The field a result column maps to.
    pub fn by_column(&self, column: &str) -> Option<&IndexedField> {
        self.by_column.get(column).map(|&pos| &self.entries[pos])
    }

    /// The first primary-key field in declaration order.
    pub fn primary_key(&self) -> Option<&IndexedField> {
        self.primary.map(|pos| &self.entries[pos])
    }

    /// Fields written by INSERT and UPDATE: no primary keys, no references.
    pub fn writable(&self) -> impl Iterator<Item = &IndexedField> {
        self.entries
            .iter()
            .filter(|f| !f.primary && f.kind() != FieldKind::Reference)
    }
}
