//! Field schema registry.
//!
//! Every synchronizable entity type declares, field by field, how its local
//! attributes map onto the CMS document: the remote field name, where in the
//! document it lives, and how its value is encoded. Remote names are listed
//! verbatim; nothing here derives one name from another.

mod entities;

use crate::domain::EntityKind;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Where a field lives in the CMS document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Top-level post attribute (`title`, `slug`).
    Root,
    /// Custom field inside the `meta` object.
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Text,
    Integer,
    Number,
}

/// How the CMS expects the members of a relationship field to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefEncoding {
    RemoteIds,
    Names,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub target: EntityKind,
    pub encoding: RefEncoding,
    /// Field on `target` that the CMS keeps pointing back at this entity.
    pub inverse: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Date,
    RepeatableText,
    Relationship(Relationship),
}

impl FieldKind {
    pub const TEXT: Self = Self::Scalar(ScalarType::Text);
    pub const INTEGER: Self = Self::Scalar(ScalarType::Integer);
    pub const NUMBER: Self = Self::Scalar(ScalarType::Number);

    #[must_use]
    pub const fn relationship(&self) -> Option<&Relationship> {
        match self {
            Self::Relationship(rel) => Some(rel),
            _ => None,
        }
    }
}

/// A typed local field value, independent of the wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    TextList(Vec<String>),
    IdList(Vec<i64>),
    /// The remote supplied the field with a blank value. Writing it empties
    /// the local field; it is never encoded.
    Cleared,
}

impl FieldValue {
    /// Blank strings and empty lists count as "no value".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::TextList(items) => items.is_empty(),
            Self::IdList(ids) => ids.is_empty(),
            Self::Cleared => true,
            Self::Integer(_) | Self::Number(_) | Self::Date(_) => false,
        }
    }

    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_text_list(self) -> Option<Vec<String>> {
        match self {
            Self::TextList(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_id_list(self) -> Option<Vec<i64>> {
        match self {
            Self::IdList(ids) => Some(ids),
            _ => None,
        }
    }
}

pub type Getter<T> = fn(&T) -> Option<FieldValue>;
pub type Setter<T> = fn(&mut T, FieldValue);

/// Mapping of one local field onto its remote counterpart.
pub struct FieldMapping<T> {
    pub local_name: &'static str,
    pub remote_name: &'static str,
    pub kind: FieldKind,
    pub placement: Placement,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldMapping<T> {
    #[must_use]
    pub const fn meta(
        local_name: &'static str,
        remote_name: &'static str,
        kind: FieldKind,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        Self {
            local_name,
            remote_name,
            kind,
            placement: Placement::Meta,
            get,
            set,
        }
    }

    #[must_use]
    pub const fn root(
        local_name: &'static str,
        remote_name: &'static str,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        Self {
            local_name,
            remote_name,
            kind: FieldKind::TEXT,
            placement: Placement::Root,
            get,
            set,
        }
    }

    /// Current value of the field, or `None` when it has nothing worth sending.
    pub fn read(&self, entity: &T) -> Option<FieldValue> {
        (self.get)(entity).filter(|value| !value.is_empty())
    }

    pub fn write(&self, entity: &mut T, value: FieldValue) {
        (self.set)(entity, value);
    }
}

impl<T> fmt::Debug for FieldMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("local_name", &self.local_name)
            .field("remote_name", &self.remote_name)
            .field("kind", &self.kind)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

/// The full field table of one entity type.
#[derive(Debug)]
pub struct EntitySchema<T> {
    pub kind: EntityKind,
    /// Collection path segment under the CMS REST root.
    pub rest_base: &'static str,
    pub fields: Vec<FieldMapping<T>>,
}

impl<T> EntitySchema<T> {
    #[must_use]
    pub fn field(&self, local_name: &str) -> Option<&FieldMapping<T>> {
        self.fields.iter().find(|f| f.local_name == local_name)
    }

    #[must_use]
    pub fn field_by_remote_name(&self, remote_name: &str) -> Option<&FieldMapping<T>> {
        self.fields.iter().find(|f| f.remote_name == remote_name)
    }

    /// Relationship fields whose inverse side is maintained by the CMS.
    pub fn bidirectional_fields(&self) -> impl Iterator<Item = (&FieldMapping<T>, &Relationship)> {
        self.fields.iter().filter_map(|f| {
            f.kind
                .relationship()
                .filter(|rel| rel.inverse.is_some())
                .map(|rel| (f, rel))
        })
    }
}

/// A domain type that can be mirrored to the CMS.
pub trait SyncEntity:
    Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn schema() -> EntitySchema<Self>;

    /// Human-readable title, used to match name-encoded relationships.
    fn display_title(&self) -> &str;
}

/// REST collection for an entity type, without needing its concrete type.
#[must_use]
pub const fn rest_base(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Movie => "movies",
        EntityKind::Actor => "actors",
        EntityKind::Director => "directors",
        EntityKind::Experiment => "experiments",
    }
}
