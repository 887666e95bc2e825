//! Product listing, one server page at a time.
//!
//! `Pager` holds the current page number, the page-group window shown in the
//! page strip, the last page descriptor and the product rows. Fetches are
//! split into a `FetchRequest` (what to ask for) and a `FetchOutcome` (what
//! came back) so the network call can run on a background task.

pub mod pager;

pub use pager::{FetchOutcome, FetchRequest, FetchTicket, Pager, PAGES_PER_GROUP};
