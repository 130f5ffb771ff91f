//! Type definitions for the scoring pipeline

pub mod failure;
pub mod transaction;
pub mod verdict;

pub use failure::{FailureKind, ScoringFailure};
pub use transaction::Transaction;
pub use verdict::{Verdict, VerdictMessage};
