//! Rust bindings to the `epicsawrap` R package.
//!
//! This crate provides access to the `epicsawrap` R package
//! (<https://github.com/IDEMSInternational/epicsawrap>) through an embedded R
//! interpreter. Access is provided through a set of wrapper functions. Each
//! wrapper function:
//!
//! - Allows the equivalent R function to be called from Rust, using Rust
//!   data types.
//! - Has a parameter list that is as close as possible to the equivalent R
//!   function's parameter list.
//! - Returns its result as a platform independent object, typically a
//!   [`DataFrame`].
//! - Has a similar structure: it validates the Rust parameters, converts
//!   them into R data types, calls the R function, and converts the returned
//!   result back into a Rust data type.
//!
//! R is initialized lazily on the first call and shared by the whole
//! process; calls themselves are synchronous and stateless.

mod error;
mod probabilities;
mod session;
mod summaries;
mod validate;

pub use epicsa_harp::{Column, DataFrame};
pub use error::*;
pub use probabilities::*;
pub use summaries::*;
