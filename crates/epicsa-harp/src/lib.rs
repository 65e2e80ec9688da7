//! High-level R abstractions for safe R object manipulation.
//!
//! This crate provides safe Rust wrappers around R's SEXP objects,
//! including automatic protection, Rust↔R value conversion, a named
//! argument call builder, and a tabular `DataFrame` type that converts
//! to and from R data frames.

mod call;
mod convert;
mod error;
mod eval;
mod frame;
mod object;
mod protect;

pub use call::*;
pub use convert::*;
pub use error::*;
pub use eval::*;
pub use frame::*;
pub use object::*;
pub use protect::*;
