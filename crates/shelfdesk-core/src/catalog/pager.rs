use std::ops::RangeInclusive;

use tracing::{debug, warn};

use crate::api::{AdminApi, ApiError, AuthContext};
use crate::models::{PageDescriptor, Product, ProductPage};

/// Number of page links shown at once in the page strip.
pub const PAGES_PER_GROUP: u32 = 5;

/// Identifies one listing request. Sequence numbers grow monotonically, so
/// a response can be recognised as older than one already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    page: u32,
}

impl FetchTicket {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// A listing request ready to be sent.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub context: AuthContext,
}

impl FetchRequest {
    pub async fn send<A: AdminApi>(self, api: &A) -> FetchOutcome {
        let result = api.list_products(&self.context, self.ticket.page).await;
        FetchOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// The answer to a `FetchRequest`.
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<ProductPage, ApiError>,
}

#[derive(Debug)]
pub struct Pager {
    current_page: u32,
    group: u32,
    descriptor: PageDescriptor,
    products: Vec<Product>,
    next_seq: u64,
    applied_seq: Option<u64>,
    // Requests numbered at or below this were sent before the last reset.
    reset_seq: u64,
    in_flight: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}

impl Pager {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            group: 0,
            descriptor: PageDescriptor::default(),
            products: Vec::new(),
            next_seq: 0,
            applied_seq: None,
            reset_seq: 0,
            in_flight: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Index of the page-group window shown in the page strip.
    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn total_pages(&self) -> u32 {
        self.descriptor.total_pages
    }

    /// Number of page-group windows: ceil(total_pages / 5).
    pub fn total_groups(&self) -> u32 {
        self.descriptor.total_pages.div_ceil(PAGES_PER_GROUP)
    }

    /// True while at least one listing request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Page numbers shown for the current group, clipped to the last page.
    pub fn visible_pages(&self) -> RangeInclusive<u32> {
        let start = self.group * PAGES_PER_GROUP + 1;
        let end = (start + PAGES_PER_GROUP - 1).min(self.descriptor.total_pages);
        start..=end
    }

    /// Jump straight to page `n`.
    ///
    /// No bounds check, and the group window is left where it is.
    pub fn set_page(&mut self, n: u32) {
        self.current_page = n;
    }

    /// Step forward.
    ///
    /// The group advances if it is not already the last one; separately the
    /// page advances if there is a next page. The two conditions are
    /// independent, so the group can drift from the page it contains.
    pub fn next(&mut self) {
        if self.group + 1 < self.total_groups() {
            self.group += 1;
        }
        if self.current_page < self.descriptor.total_pages {
            self.current_page += 1;
        }
    }

    /// Step back; the mirror of `next`, with the same independence.
    pub fn previous(&mut self) {
        if self.group > 0 {
            self.group -= 1;
        }
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Start a fetch of the current page.
    ///
    /// Returns `None` without a context: listing only happens while signed in.
    pub fn begin_fetch(&mut self, context: Option<&AuthContext>) -> Option<FetchRequest> {
        let context = context?.clone();
        self.next_seq += 1;
        self.in_flight += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            page: self.current_page,
        };
        debug!(page = ticket.page, seq = ticket.seq, "Fetching products");
        Some(FetchRequest { ticket, context })
    }

    /// Apply a finished fetch. Returns true if the listing changed.
    ///
    /// Failures are logged and leave the previous rows and descriptor in
    /// place. A response older than one already applied is dropped.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) -> bool {
        let FetchOutcome { ticket, result } = outcome;

        // Already uncounted by reset
        if ticket.seq <= self.reset_seq {
            debug!(page = ticket.page, seq = ticket.seq, "Dropping products response from before reset");
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            debug!(page = ticket.page, seq = ticket.seq, "Dropping stale products response");
            return false;
        }

        match result {
            Ok(page) => {
                self.products = page.products;
                self.descriptor = page.pagination;
                self.applied_seq = Some(ticket.seq);
                true
            }
            Err(e) => {
                warn!(error = %e, page = ticket.page, "Failed to fetch products");
                false
            }
        }
    }

    /// Forget everything, e.g. after sign-out.
    pub fn reset(&mut self) {
        let next_seq = self.next_seq;
        *self = Self::new();
        // Keep numbering so responses to requests sent before the reset stay stale.
        self.next_seq = next_seq;
        self.applied_seq = Some(next_seq);
        self.reset_seq = next_seq;
    }
}
