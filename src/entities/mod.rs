//! Persisted catalogue records

mod author;
mod book;

pub use author::{Author, AuthorData};
pub use book::{Book, BookData};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to the microseconds a `TIMESTAMPTZ` column keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
