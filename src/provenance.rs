//! The `auto:<tag>:<id_or_group_key>` provenance key linking a generated
//! reminder back to the item(s) that produced it.
//!
//! The string form is what gets stored; everything inside the engine works on
//! the parsed [`Provenance`].

use std::fmt;
use std::str::FromStr;

use crate::error::ProvenanceError;
use crate::grouping::GroupKey;
use crate::models::{ReminderScope, SourceType};

pub const PREFIX: &str = "auto:";

/// What a provenance key points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Item(u64),
    Group(GroupKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Provenance {
    pub source: SourceType,
    pub target: Target,
}

impl Provenance {
    pub fn item(source: SourceType, id: u64) -> Self {
        Self { source, target: Target::Item(id) }
    }

    pub fn group(source: SourceType, key: GroupKey) -> Self {
        Self { source, target: Target::Group(key) }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

/// The `<tag>` of an `auto:<tag>:...` key, without validating the rest.
pub fn tag_of(key: &str) -> Option<&str> {
    key.strip_prefix(PREFIX)?.split_once(':').map(|(tag, _)| tag)
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Item(id) => write!(f, "{id}"),
            Target::Group(key) => write!(f, "{key}"),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}:{}", self.source.provenance_tag(), self.target)
    }
}

impl FromStr for Provenance {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| ProvenanceError::MissingPrefix(s.to_string()))?;
        let (tag, rest) = body
            .split_once(':')
            .ok_or_else(|| ProvenanceError::Malformed(s.to_string()))?;
        let source = SourceType::from_provenance_tag(tag)
            .ok_or_else(|| ProvenanceError::UnknownTag(tag.to_string()))?;
        let target = match source.scope() {
            ReminderScope::PerRecord => {
                let id: u64 = rest
                    .parse()
                    .map_err(|_| ProvenanceError::BadId(rest.to_string()))?;
                // reject "007" and "+7" so the key round-trips exactly
                if id.to_string() != rest {
                    return Err(ProvenanceError::BadId(rest.to_string()));
                }
                Target::Item(id)
            }
            ReminderScope::Grouped => Target::Group(rest.parse()?),
        };
        Ok(Provenance { source, target })
    }
}
