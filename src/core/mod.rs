//! Command interpretation: alias normalization, parsing, and job records.

pub mod job;
pub mod normalize;
pub mod parser;
