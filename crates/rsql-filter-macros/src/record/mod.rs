//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates the `Record` implementation and attribute name constants from
//! a struct's named fields and their `#[rsql(...)]` annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
