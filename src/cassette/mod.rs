//! Cassette format for recording and replaying language-model exchanges.

pub mod format;
pub mod recorder;
pub mod replayer;
