//! Developer movement analysis around a pivot repository.
//!
//! Splits each developer's contribution history into the repositories they
//! touched before and after their first pivot contribution, inverts that into
//! per-repository membership, and counts the repositories shared by every
//! fixed-size group of developers. Also provides windowed co-contribution and
//! key-person analyses over the same event tables, plus monthly
//! contribution counts.

pub mod copresence;
pub mod groups;
pub mod keyperson;
pub mod membership;
pub mod monthly;
pub mod partition;
pub mod summary;
pub mod timeline;
