//! ea-journal — append-only record of operation outcomes.
//!
//! One line per terminal outcome of initialize, deploy, upgrade and test.
//! Lines are never read back or rewritten by the manager.

pub mod error;
pub mod journal;
pub mod record;

pub use error::{JournalError, JournalResult};
pub use journal::{FileJournal, Journal, MemoryJournal};
pub use record::{OperationKind, OperationRecord, Outcome, tag_detail, test_detail};
