//! Config file sources.

pub mod global_file;
