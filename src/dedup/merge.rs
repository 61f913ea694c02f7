//! Which record of a duplicate pair survives.
//!
//! Every stage applies `prefer` to its own completeness measure: description
//! length for the URL and title stages, combined text length for the semantic
//! stage.

/// Outcome of comparing two duplicates by completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    First,
    Second,
}

/// Keep the first unless the second is strictly more complete.
pub fn prefer(first_len: usize, second_len: usize) -> Keep {
    if second_len > first_len {
        Keep::Second
    } else {
        Keep::First
    }
}
