//! Expose quire's internal API for use in integration tests. It is not meant
//! to be a stable library interface.
pub mod builder;
pub mod cli;
pub mod corpus;
pub mod report;
