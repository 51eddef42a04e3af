//! # Heka Splitter
//!
//! Turns a raw byte stream into discrete record boundaries ahead of decoding.
//! Four variants cover the input side's common delimiting
//! strategies; all share the [`Splitter`] contract and [`SplitOptions`].

mod error;
mod options;
mod pattern_grouping;
mod regex_splitter;
mod splitter;
mod token;

pub mod framing;

pub use error::SplitError;
pub use options::SplitOptions;
pub use pattern_grouping::PatternGroupingSplitter;
pub use regex_splitter::{DelimiterLocation, RegexSplitter};
pub use splitter::{RecordBytes, Splitter};
pub use token::TokenSplitter;
