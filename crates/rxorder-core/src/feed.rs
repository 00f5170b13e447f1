//! Order list paging and search.
//!
//! Paging follows the server's page counter only: pages are requested in
//! order starting at 1 and loading stops once the reported page count is
//! reached. A response without a page count is treated as the full list.

use tracing::debug;

use crate::api::OrdersQuery;
use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::models::{Order, OrderPage};

/// Orders whose patient name, doctor name, id or status label contains
/// `term`, ignoring case. A blank term keeps every order.
pub fn filter_orders<'a>(orders: &'a [Order], term: &str) -> Vec<&'a Order> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return orders.iter().collect();
    }

    orders
        .iter()
        .filter(|order| {
            [
                order.patient_name.as_str(),
                order.doctor_name.as_str(),
                order.id.as_str(),
                order.status.label(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// One page fetch, tied to the feed state it was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    generation: u64,
}

/// Accumulated order list for an infinite-scroll screen.
#[derive(Debug, Clone, Default)]
pub struct OrderFeed {
    orders: Vec<Order>,
    loaded_pages: u32,
    total_pages: Option<u32>,
    total: Option<u64>,
    /// Bumped by every reset.
    generation: u64,
}

impl OrderFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page to request next, or `None` once everything is loaded.
    pub fn next_page(&self) -> Option<u32> {
        if self.loaded_pages == 0 {
            return Some(1);
        }
        match self.total_pages {
            Some(pages) if self.loaded_pages < pages => Some(self.loaded_pages + 1),
            _ => None,
        }
    }

    /// Request for [`next_page`](OrderFeed::next_page), to be handed back
    /// to [`accept`](OrderFeed::accept) with the response.
    pub fn next_request(&self) -> Option<PageRequest> {
        self.next_page().map(|page| PageRequest {
            page,
            generation: self.generation,
        })
    }

    pub fn has_more(&self) -> bool {
        self.next_page().is_some()
    }

    /// Append the page fetched for `request`. A request issued before the
    /// last reset, or for a page other than the next one, is stale and its
    /// page is dropped.
    pub fn accept(&mut self, request: PageRequest, page: OrderPage) -> bool {
        if request.generation != self.generation || self.next_page() != Some(request.page) {
            debug!(
                page = request.page,
                expected = ?self.next_page(),
                "dropping stale order page"
            );
            return false;
        }
        self.loaded_pages = request.page;
        self.total_pages = page.pages;
        self.total = page.total;
        self.orders.extend(page.orders);
        true
    }

    /// Drop everything loaded so far (pull-to-refresh, sign-out). Requests
    /// still in flight become stale.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::default()
        };
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Server-reported order count, falling back to what has been loaded.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.orders.len() as u64)
    }

    pub fn search(&self, term: &str) -> Vec<&Order> {
        filter_orders(&self.orders, term)
    }

    /// Fetch and append the next page. Returns `false` when there was
    /// nothing left to load.
    pub async fn load_more(&mut self, client: &ApiClient) -> ClientResult<bool> {
        let Some(request) = self.next_request() else {
            return Ok(false);
        };
        let fetched = client.get_orders(OrdersQuery::page(request.page)).await?;
        debug!(
            page = request.page,
            count = fetched.orders.len(),
            pages = ?fetched.pages,
            "order page loaded"
        );
        Ok(self.accept(request, fetched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::Utc;

    fn order(id: &str, patient: &str, doctor: &str, status: OrderStatus) -> Order {
        Order {
            id: id.into(),
            status,
            created_at: Utc::now(),
            doctor_name: doctor.into(),
            patient_name: patient.into(),
            hospital_address: "12 MG Road".into(),
            referral_name: None,
            coupon_code: None,
            prescription_urls: vec![],
        }
    }

    fn sample() -> Vec<Order> {
        vec![
            order("101", "Asha Rao", "Dr. Mehta", OrderStatus::Delivered),
            order("102", "Vikram Singh", "Dr. Iyer", OrderStatus::PendingVerification),
            order("203", "Meera Nair", "Dr. Mehta", OrderStatus::OutForDelivery),
        ]
    }

    #[test]
    fn test_blank_term_keeps_all() {
        let orders = sample();
        assert_eq!(filter_orders(&orders, "  ").len(), 3);
    }

    #[test]
    fn test_filter_by_each_field() {
        let orders = sample();
        assert_eq!(filter_orders(&orders, "asha")[0].id, "101");
        assert_eq!(filter_orders(&orders, "MEHTA").len(), 2);
        assert_eq!(filter_orders(&orders, "20")[0].id, "203");
        assert_eq!(filter_orders(&orders, "pending")[0].id, "102");
        assert!(filter_orders(&orders, "nobody").is_empty());
    }

    fn page(orders: Vec<Order>, pages: Option<u32>, total: Option<u64>) -> OrderPage {
        OrderPage {
            orders,
            pages,
            total,
        }
    }

    #[test]
    fn test_feed_pages_until_server_count() {
        let mut feed = OrderFeed::new();
        assert_eq!(feed.next_page(), Some(1));

        let first = feed.next_request().unwrap();
        assert!(feed.accept(first, page(sample(), Some(2), Some(4))));
        assert_eq!(feed.next_page(), Some(2));
        assert_eq!(feed.total(), 4);

        let second = feed.next_request().unwrap();
        assert_eq!(second.page, 2);
        feed.accept(
            second,
            page(
                vec![order("300", "Ravi", "Dr. Rao", OrderStatus::Preparing)],
                Some(2),
                Some(4),
            ),
        );
        assert_eq!(feed.next_page(), None);
        assert!(feed.next_request().is_none());
        assert!(!feed.has_more());
        assert_eq!(feed.orders().len(), 4);
    }

    #[test]
    fn test_bare_page_is_complete() {
        let mut feed = OrderFeed::new();
        let request = feed.next_request().unwrap();
        feed.accept(request, page(sample(), None, None));
        assert!(!feed.has_more());
        assert_eq!(feed.total(), 3);
    }

    #[test]
    fn test_out_of_order_page_dropped() {
        let mut feed = OrderFeed::new();
        let first = feed.next_request().unwrap();
        let skipped = PageRequest { page: 2, ..first };
        assert!(!feed.accept(skipped, OrderPage::default()));

        assert!(feed.accept(first, page(sample(), Some(3), None)));
        assert!(!feed.accept(first, page(sample(), Some(3), None)));
        assert_eq!(feed.orders().len(), 3);
        assert_eq!(feed.next_page(), Some(2));
    }

    #[test]
    fn test_request_from_before_reset_dropped() {
        let mut feed = OrderFeed::new();
        let stale = feed.next_request().unwrap();
        feed.reset();
        let fresh = feed.next_request().unwrap();
        assert_eq!(stale.page, fresh.page);

        let old = vec![order("1", "Previous Patient", "Dr. Old", OrderStatus::Delivered)];
        assert!(!feed.accept(stale, page(old, Some(1), None)));
        assert!(feed.accept(fresh, page(sample(), Some(1), None)));

        assert_eq!(feed.orders().len(), 3);
        assert!(feed.search("previous").is_empty());
    }

    #[test]
    fn test_reset() {
        let mut feed = OrderFeed::new();
        let request = feed.next_request().unwrap();
        feed.accept(request, page(sample(), Some(1), Some(3)));
        feed.reset();
        assert!(feed.orders().is_empty());
        assert_eq!(feed.next_page(), Some(1));
    }

    #[test]
    fn test_search_over_loaded_orders() {
        let mut feed = OrderFeed::new();
        let request = feed.next_request().unwrap();
        feed.accept(request, page(sample(), Some(1), Some(3)));
        assert_eq!(feed.search("delivery")[0].id, "203");
    }
}
