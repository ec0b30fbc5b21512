//! CSV ingestion and export for developer movement analysis.
//!
//! Readers turn GitHub activity exports into [`devmove_core::ContributionEvent`]s
//! and load previously written membership or count tables; writers emit the
//! result tables produced by `devmove-movement`.

pub mod events;
pub mod export;
pub mod lists;
pub mod normalize;
pub mod table;
