//! Relationship links carried by a task.
//!
//! # Tolerant decoding
//!
//! Task records come from a loosely-typed UI store and from records written
//! before relationships existed. Every relationship field therefore decodes
//! into a [`Field`]: it may be [`Field::Missing`], [`Field::Malformed`]
//! (present with the wrong JSON type), or [`Field::Present`]. Decoding never
//! fails because of a relationship field; the validator reports the problem
//! instead. Read-only accessors treat missing and malformed lists as empty.
//!
//! Id lists decode element by element into an [`IdList`]: a list is only
//! malformed when the value is not an array. Non-string entries are set
//! aside with their position and the string ids keep counting as links.

#![allow(clippy::module_name_repetitions)]

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::task::Task;

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A relationship field as found on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// The key was absent.
    Missing,
    /// The key was present but its value did not have the expected shape.
    Malformed(Value),
    /// The key was present and decoded.
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<T> Field<T> {
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// The decoded value, if the field was present and well-formed.
    pub const fn as_present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Malformed(_) => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(value) => Self::Present(value),
            Err(_) => Self::Malformed(raw),
        })
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Malformed(raw) => raw.serialize(serializer),
            Self::Present(value) => value.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// IdList
// ---------------------------------------------------------------------------

/// A decoded id list: the string ids, plus any entries of another JSON type.
///
/// Derefs to the string ids. Rejected entries keep their wire position so
/// they serialize back where they were.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdList {
    ids: Vec<String>,
    rejected: Vec<(usize, Value)>,
}

impl IdList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// The string ids, in wire order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    /// Entries that were not strings, with their position in the array.
    #[must_use]
    pub fn rejected(&self) -> &[(usize, Value)] {
        &self.rejected
    }
}

impl Deref for IdList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.ids
    }
}

impl<'l> IntoIterator for &'l IdList {
    type Item = &'l String;
    type IntoIter = std::slice::Iter<'l, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl From<Vec<String>> for IdList {
    fn from(ids: Vec<String>) -> Self {
        Self {
            ids,
            rejected: Vec::new(),
        }
    }
}

impl FromIterator<String> for IdList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'de> Deserialize<'de> for IdList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Value>::deserialize(deserializer)?;
        let mut list = Self::new();
        for (position, entry) in entries.into_iter().enumerate() {
            match entry {
                Value::String(id) => list.ids.push(id),
                other => list.rejected.push((position, other)),
            }
        }
        Ok(list)
    }
}

impl Serialize for IdList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.ids.len() + self.rejected.len();
        let mut seq = serializer.serialize_seq(Some(len))?;
        let mut ids = self.ids.iter();
        let mut rejected = self.rejected.iter().peekable();
        for position in 0..len {
            if let Some((_, entry)) = rejected.next_if(|(at, _)| *at == position) {
                seq.serialize_element(entry)?;
            } else if let Some(id) = ids.next() {
                seq.serialize_element(id)?;
            }
        }
        seq.end()
    }
}

// ---------------------------------------------------------------------------
// DependencyKind
// ---------------------------------------------------------------------------

/// The five named dependency lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Blocks,
    BlockedBy,
    Related,
    Duplicates,
    Supersedes,
}

impl DependencyKind {
    /// Every kind, in the order lists are validated.
    pub const ALL: [Self; 5] = [
        Self::Blocks,
        Self::BlockedBy,
        Self::Related,
        Self::Duplicates,
        Self::Supersedes,
    ];

    /// Wire name of the list (`blockedBy`, not `blocked_by`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::BlockedBy => "blockedBy",
            Self::Related => "related",
            Self::Duplicates => "duplicates",
            Self::Supersedes => "supersedes",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown dependency kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dependency kind '{0}' (expected blocks, blockedBy, related, duplicates or supersedes)")]
pub struct UnknownDependencyKind(pub String);

impl FromStr for DependencyKind {
    type Err = UnknownDependencyKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(Self::Blocks),
            "blockedBy" | "blocked_by" | "blocked-by" => Ok(Self::BlockedBy),
            "related" => Ok(Self::Related),
            "duplicates" => Ok(Self::Duplicates),
            "supersedes" => Ok(Self::Supersedes),
            other => Err(UnknownDependencyKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DependencyLists
// ---------------------------------------------------------------------------

/// The `relationships.dependencies` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyLists {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub blocks: Field<IdList>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub blocked_by: Field<IdList>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub related: Field<IdList>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub duplicates: Field<IdList>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub supersedes: Field<IdList>,
}

impl DependencyLists {
    /// Five present, empty lists.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            blocks: Field::Present(IdList::new()),
            blocked_by: Field::Present(IdList::new()),
            related: Field::Present(IdList::new()),
            duplicates: Field::Present(IdList::new()),
            supersedes: Field::Present(IdList::new()),
        }
    }

    /// The raw field for one dependency kind.
    #[must_use]
    pub const fn list(&self, kind: DependencyKind) -> &Field<IdList> {
        match kind {
            DependencyKind::Blocks => &self.blocks,
            DependencyKind::BlockedBy => &self.blocked_by,
            DependencyKind::Related => &self.related,
            DependencyKind::Duplicates => &self.duplicates,
            DependencyKind::Supersedes => &self.supersedes,
        }
    }

    pub fn list_mut(&mut self, kind: DependencyKind) -> &mut Field<IdList> {
        match kind {
            DependencyKind::Blocks => &mut self.blocks,
            DependencyKind::BlockedBy => &mut self.blocked_by,
            DependencyKind::Related => &mut self.related,
            DependencyKind::Duplicates => &mut self.duplicates,
            DependencyKind::Supersedes => &mut self.supersedes,
        }
    }

    /// Ids in one list; empty when the list is missing or malformed.
    #[must_use]
    pub fn ids(&self, kind: DependencyKind) -> &[String] {
        self.list(kind).as_present().map_or(&[], IdList::as_slice)
    }
}

impl Default for DependencyLists {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// The `relationships` record owned by one task.
///
/// `Default` is the canonical empty record, not an all-missing one: use it
/// as the template for new tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub parent: Field<Option<String>>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub subtasks: Field<IdList>,
    #[serde(default, skip_serializing_if = "Field::is_missing")]
    pub dependencies: Field<DependencyLists>,
}

impl Relationships {
    /// Parent id when set to a non-empty string.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        match &self.parent {
            Field::Present(Some(parent)) if !parent.is_empty() => Some(parent.as_str()),
            _ => None,
        }
    }

    /// Subtask ids; empty when the list is missing or malformed.
    #[must_use]
    pub fn subtask_ids(&self) -> &[String] {
        self.subtasks.as_present().map_or(&[], IdList::as_slice)
    }

    /// The dependencies record when present and well-formed.
    #[must_use]
    pub const fn dependencies(&self) -> Option<&DependencyLists> {
        self.dependencies.as_present()
    }

    /// Ids in one dependency list; empty when anything on the way is absent.
    #[must_use]
    pub fn ids(&self, kind: DependencyKind) -> &[String] {
        self.dependencies().map_or(&[], |deps| deps.ids(kind))
    }

    /// The present list for `kind`, if any.
    #[must_use]
    pub fn present_list(&self, kind: DependencyKind) -> Option<&[String]> {
        self.dependencies()
            .and_then(|deps| deps.list(kind).as_present())
            .map(IdList::as_slice)
    }
}

impl Default for Relationships {
    fn default() -> Self {
        default_relationships()
    }
}

/// The canonical empty relationships record: no parent, no subtasks, five
/// empty dependency lists.
#[must_use]
pub const fn default_relationships() -> Relationships {
    Relationships {
        parent: Field::Present(None),
        subtasks: Field::Present(IdList::new()),
        dependencies: Field::Present(DependencyLists::empty()),
    }
}

/// A task's relationships, or the default record for tasks that predate
/// relationships.
#[must_use]
pub fn safe_relationships(task: &Task) -> Cow<'_, Relationships> {
    task.relationships
        .as_ref()
        .map_or_else(|| Cow::Owned(default_relationships()), Cow::Borrowed)
}
