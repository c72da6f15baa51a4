// Domain records: processing runs, permanent profiles, and the shared
// vocabulary types produced by LLM extraction.

pub mod candidate;
pub mod common;
pub mod listing;

pub use candidate::{
    CandidateExtraction, CandidateProfile, CandidateRun, CreativityAssessment,
};
pub use common::{FlexibleDate, RunStatus};
pub use listing::{Listing, ListingExtraction, ListingRun};
