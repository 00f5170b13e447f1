//! Order endpoints. All of them require a signed-in user.

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, RequestOptions};
use crate::models::{Order, OrderDraft, OrderPage};

pub const ORDERS_PATH: &str = "/api/orders";

/// Query for the order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrdersQuery {
    /// 1-based page number; omitted to let the server pick.
    pub page: Option<u32>,
}

impl OrdersQuery {
    pub fn page(page: u32) -> Self {
        Self { page: Some(page) }
    }

    fn to_options(self) -> RequestOptions {
        match self.page {
            Some(page) => RequestOptions::default().with_query("page", page),
            None => RequestOptions::default(),
        }
    }
}

impl ApiClient {
    /// Fail before dispatch when no token is held.
    fn require_token(&self) -> ClientResult<()> {
        if self.session().token().is_none() {
            return Err(ClientError::MissingToken);
        }
        Ok(())
    }

    /// `GET /api/orders`.
    pub async fn get_orders(&self, query: OrdersQuery) -> ClientResult<OrderPage> {
        self.require_token()?;
        self.get(ORDERS_PATH, &query.to_options()).await
    }

    /// `POST /api/orders`. The draft is trimmed before it is sent.
    pub async fn create_order(&self, draft: &OrderDraft) -> ClientResult<Order> {
        self.require_token()?;
        self.post(ORDERS_PATH, &draft.normalized()).await
    }

    /// `PUT /api/orders/{id}`.
    pub async fn update_order(&self, order_id: &str, draft: &OrderDraft) -> ClientResult<Order> {
        self.require_token()?;
        self.put(&format!("{}/{}", ORDERS_PATH, order_id), &draft.normalized())
            .await
    }
}
