//! Assertion layer for testing static-analysis rules.
//!
//! Rule authors describe what a rule must (or must not) report for a given
//! snippet, and where. A test reads like this:
//!
//! ```rust
//! use rulekit_fixture::AnalyzerFixture;
//!
//! let fixture = AnalyzerFixture::new(my_front_end(), || MyRule::new());
//!
//! // The marked expression must trigger the rule.
//! fixture
//!     .expect_diagnostic("let x = [|1 + true|];", "invalid-addition")
//!     .unwrap();
//!
//! // ...and a well-typed snippet must not.
//! fixture
//!     .expect_no_diagnostic("let x = 1 + 2;", "invalid-addition")
//!     .unwrap();
//! ```
//!
//! Locations can come from three places, all interchangeable:
//!
//! - an inline **marker** in the snippet: `[|...|]`, or `{|name:...|}` for
//!   named groups ([`CodeMarkup`] strips them and records their spans),
//! - a 1-based **line number** ([`LineLocator`]),
//! - an explicit **character span** ([`TextSpanLocator`]).
//!
//! Each `expect_*` call is one independent transaction: it runs the
//! configured front end over the snippet via [`run`], filters the collected
//! diagnostics by identifier and location, and returns a structured
//! [`Failure`] when the expectation is violated. Front-end trouble is kept
//! apart from rule findings: a snippet that does not compile surfaces as
//! [`Failure::UnexpectedCompileError`] and a rule that panics mid-analysis
//! as [`Failure::AnalyzerCrashed`], so neither can masquerade as "no
//! diagnostic found".

pub use crate::fixture::{AnalyzerFixture, Failure, ReportedDiagnostic};
pub use crate::locator::{LineLocator, Locator, LocatorError, MarkerLocator, TextSpanLocator};
pub use crate::markup::{CodeMarkup, Marker, MarkupError};
pub use crate::runner::{RunResult, run};

mod fixture;
mod locator;
mod markup;
mod runner;
