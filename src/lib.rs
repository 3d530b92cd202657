#![warn(missing_docs, missing_debug_implementations)]

//! Check whether a handle is available across blogs, social platforms,
//! developer tools and other online services.
//!
//! Each service gets exactly one HTTP request. Services are checked
//! one after another in a fixed order (category, then title), progress is
//! reported through an [`Observer`](check::Observer), and the results are
//! aggregated into a [`Report`](report::Report) that says whether the name is
//! free everywhere.
//!
//! # Example
//!
//! ```no_run
//! use handle_avail::check::{CheckOptions, check_name};
//!
//! let report = check_name("my-handle", &CheckOptions::new()).unwrap();
//! for result in report.results() {
//!     println!("{}: {:?}", result.descriptor(), result.available());
//! }
//! match report.unique() {
//!     Some(true) => println!("free everywhere"),
//!     Some(false) => println!("taken somewhere"),
//!     None => println!("some checks failed"),
//! }
//! ```

pub mod check;
pub mod filter;
pub mod http;
pub mod registry;
pub mod report;
pub mod service;
