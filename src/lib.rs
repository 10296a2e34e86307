//! Core library for the partslist-merge command line application.
//!
//! The library consolidates per-project parts lists into one deduplicated
//! dataset. Filename keys live in [`partslist::merge::keys`], per-document
//! normalisation in [`partslist::merge::normalize`], recency-based
//! deduplication in [`partslist::merge::dedup`], the driving loop in
//! [`partslist::merge::pipeline`], and output assembly in
//! [`partslist::merge::assemble`]. Spreadsheet adapters sit under
//! [`partslist::merge::io`].

pub mod partslist;

pub use partslist::merge::{
    MergeError, Result, assemble, config, dedup, error, io, keys, model, normalize, pipeline, run,
};
