//! Page identifier validation.
//!
//! Only the canonical hyphenated form is accepted: five groups of 8, 4, 4, 4
//! and 12 hex digits, in either case. `Uuid::parse_str` alone is too lenient
//! (it also takes simple, braced and URN forms), so the shape is checked
//! first and the parsed value kept for display.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::ValidationError;

const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

/// A validated page id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(Uuid);

impl PageId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if !is_canonical_uuid(input) {
            return Err(ValidationError {
                input: input.to_string(),
            });
        }
        Uuid::parse_str(input)
            .map(PageId)
            .map_err(|_| ValidationError {
                input: input.to_string(),
            })
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for PageId {
    fn from(id: Uuid) -> Self {
        PageId(id)
    }
}

impl FromStr for PageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::parse(s)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// `true` if `input` is exactly `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
pub fn is_canonical_uuid(input: &str) -> bool {
    let groups: Vec<&str> = input.split('-').collect();
    groups.len() == GROUP_LENGTHS.len()
        && groups
            .iter()
            .zip(GROUP_LENGTHS)
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}
