//! Patient data loading and access.
//!
//! Exposes the dataset as a lookup-by-id provider; the pipeline core never
//! touches files itself.

pub mod provider;
pub mod records;

// Re-export commonly used types
pub use provider::{DataProvider, JsonDataProvider};
pub use records::{Claim, ClaimLine, PatientBundle, PatientRecord};
