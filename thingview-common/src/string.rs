use core::{fmt::Display, ops::Deref};

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

use crate::utils::escape_html_for_id_class;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingId(CompactString);

impl ThingId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<T: AsRef<str>> From<T> for ThingId {
    fn from(value: T) -> Self {
        ThingId(CompactString::from(value.as_ref()))
    }
}

impl Deref for ThingId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Display for ThingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Element id derived from a property name, safe to use as a DOM id or class.
///
/// The same prefix and name always produce the same id, so markup stays
/// addressable across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomId(CompactString);

impl DomId {
    pub fn new(prefix: &str, name: &str) -> Self {
        Self(format_compact!("{prefix}-{}", escape_html_for_id_class(name)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for DomId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Display for DomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
