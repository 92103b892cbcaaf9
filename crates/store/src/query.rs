use chrono::NaiveDate;
use domain::{Identity, Order, OrderStatus, Product};

/// Who a report query runs for.
///
/// A customer scope only ever sees that customer's own orders; the admin
/// scope sees everything. Soft-deleted orders are excluded from both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// Unrestricted admin view.
    Admin,

    /// Restricted to the orders owned by this username.
    Customer(String),
}

impl ReportScope {
    /// Derives the scope from a resolved identity.
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_admin() {
            ReportScope::Admin
        } else {
            ReportScope::Customer(identity.username.clone())
        }
    }
}

/// Builder for order report filters.
///
/// All criteria are optional and combine with AND. Dates are inclusive
/// calendar days in UTC; the `to` bound extends to end-of-day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Filter by exact status (case-insensitive on the stored value).
    pub status: Option<OrderStatus>,

    /// Case-insensitive substring match on the customer display name.
    /// Only honored for the admin scope.
    pub customer_name: Option<String>,

    /// Orders placed on or after this UTC date.
    pub from_date: Option<NaiveDate>,

    /// Orders placed on or before this UTC date (inclusive end-of-day).
    pub to_date: Option<NaiveDate>,
}

impl ReportFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by order status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by customer-name substring (admin only).
    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Filters to orders placed on or after this date.
    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    /// Filters to orders placed on or before this date.
    pub fn to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Returns true if no criteria are set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.customer_name.is_none()
            && self.from_date.is_none()
            && self.to_date.is_none()
    }
}

/// One page of an order report.
#[derive(Debug, Clone)]
pub struct OrderPage {
    /// The orders on this page, newest first.
    pub orders: Vec<Order>,

    /// 1-based page number that was served.
    pub page: u32,

    /// Total page count, computed from the role-scoped (unfiltered) total.
    pub total_pages: u32,
}

/// One page of the active-product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    /// The products on this page.
    pub products: Vec<Product>,

    /// 1-based page number that was served.
    pub page: u32,

    /// Total page count over all active products.
    pub total_pages: u32,
}

/// Computes a total-page count, rounding up.
pub(crate) fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}
