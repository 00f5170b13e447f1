//! RxOrder Core Library
//!
//! Client core for the prescription ordering app: phone + OTP sign-in, the
//! persisted session, and authenticated access to the order API.
//!
//! # Architecture
//!
//! ```text
//!   Screen ──► Domain API call ──► ApiClient ──► HTTP backend
//!                 │                   │   ▲
//!       (no token: fail fast)         │   │ Authorization: Bearer <token>
//!                                     ▼   │
//!                               SessionStore ◄──► SQLite (record + credential)
//!                                     │
//!                         401/403: clear session
//!                                     │
//!                                     ▼
//!                            NavigationTrigger ──► reset to Login
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence (serialized session record, credential slot)
//! - [`models`]: Domain types (Session, UserProfile, Order, OrderDraft, etc.)
//! - [`session`]: Persisted session store
//! - [`http`]: HTTP client wrapper and error normalization
//! - [`api`]: Typed endpoint calls
//! - [`navigation`]: Navigation trigger for forced resets
//! - [`validation`]: Phone, OTP and order form checks
//! - [`feed`]: Order list paging and search

pub mod api;
pub mod db;
pub mod error;
pub mod feed;
pub mod http;
pub mod models;
pub mod navigation;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use api::{LoginPayload, OrdersQuery, VerifyOtpPayload, VerifyOtpResponse};
pub use db::Database;
pub use error::{ClientError, ClientResult};
pub use feed::{filter_orders, OrderFeed, PageRequest};
pub use http::{
    ApiClient, ClientConfig, ErrorKind, NormalizedError, RequestOptions, SessionExpiredCallback,
};
pub use models::{Order, OrderDraft, OrderPage, OrderStatus, Session, UserProfile};
pub use navigation::{initial_screen, NavigationTrigger, Navigator, Screen};
pub use session::SessionStore;
pub use validation::{OrderDraftErrors, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// =========================================================================
// FFI Error Type
// =========================================================================

/// Failure category as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiErrorKind {
    AuthFailure,
    ServerError,
    NoResponse,
    LocalTimeout,
    Unknown,
}

impl From<ErrorKind> for FfiErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::AuthFailure => FfiErrorKind::AuthFailure,
            ErrorKind::ServerError => FfiErrorKind::ServerError,
            ErrorKind::NoResponse => FfiErrorKind::NoResponse,
            ErrorKind::LocalTimeout => FfiErrorKind::LocalTimeout,
            ErrorKind::Unknown => FfiErrorKind::Unknown,
        }
    }
}

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxOrderError {
    #[error("{message}")]
    RequestFailed {
        kind: FfiErrorKind,
        message: String,
        status: Option<u16>,
        /// Response body as JSON text
        data: Option<String>,
        is_network_error: bool,
        is_timeout: bool,
    },

    #[error("No authentication token available")]
    MissingToken,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Setup error: {0}")]
    SetupError(String),
}

impl From<NormalizedError> for RxOrderError {
    fn from(e: NormalizedError) -> Self {
        RxOrderError::RequestFailed {
            kind: e.kind.into(),
            message: e.message,
            status: e.status,
            data: e.data.map(|d| d.to_string()),
            is_network_error: e.is_network_error,
            is_timeout: e.is_timeout,
        }
    }
}

impl From<ClientError> for RxOrderError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::MissingToken => RxOrderError::MissingToken,
            ClientError::Request(e) => e.into(),
            ClientError::Serialization(e) => RxOrderError::SerializationError(e.to_string()),
            ClientError::Storage(e) => RxOrderError::StorageError(e.to_string()),
            ClientError::Setup(e) => RxOrderError::SetupError(e.to_string()),
        }
    }
}

impl From<db::DbError> for RxOrderError {
    fn from(e: db::DbError) -> Self {
        RxOrderError::StorageError(e.to_string())
    }
}

impl From<ValidationError> for RxOrderError {
    fn from(e: ValidationError) -> Self {
        RxOrderError::InvalidInput(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Default configuration, honouring `API_BASE_URL`.
#[uniffi::export]
pub fn default_client_config() -> FfiClientConfig {
    ClientConfig::from_env().into()
}

/// Open the client with its session persisted at `state_path`.
#[uniffi::export]
pub fn open_client(
    config: FfiClientConfig,
    state_path: String,
) -> Result<Arc<RxOrderCore>, RxOrderError> {
    let session = SessionStore::open(&state_path)?;
    RxOrderCore::build(config.into(), session)
}

/// Open the client with an in-memory session (for testing).
#[uniffi::export]
pub fn open_client_in_memory(config: FfiClientConfig) -> Result<Arc<RxOrderCore>, RxOrderError> {
    let session = SessionStore::open_in_memory()?;
    RxOrderCore::build(config.into(), session)
}

/// Validate a national mobile number and return it in international form.
#[uniffi::export]
pub fn validate_phone_number(phone: String) -> Result<String, RxOrderError> {
    Ok(validation::to_international(&phone)?)
}

#[uniffi::export]
pub fn validate_otp_code(code: String) -> Result<(), RxOrderError> {
    Ok(validation::validate_otp(&code)?)
}

/// Per-field errors for the order form; all `None` when the draft is valid.
#[uniffi::export]
pub fn check_order_draft(draft: FfiOrderDraft) -> FfiOrderDraftErrors {
    match OrderDraft::from(draft).validate() {
        Err(ValidationError::OrderIncomplete(errors)) => errors.into(),
        _ => FfiOrderDraftErrors::default(),
    }
}

// =========================================================================
// Navigation Callback
// =========================================================================

/// Implemented by the UI once its navigation tree has mounted.
#[uniffi::export(callback_interface)]
pub trait NavigationListener: Send + Sync {
    /// Replace the whole stack with `routes` (route names).
    fn reset(&self, routes: Vec<String>);
}

struct ListenerNavigator(Box<dyn NavigationListener>);

impl Navigator for ListenerNavigator {
    fn reset(&self, routes: &[Screen]) {
        self.0.reset(
            routes
                .iter()
                .map(|screen| screen.route_name().to_string())
                .collect(),
        );
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Client handle shared with the UI.
#[derive(uniffi::Object)]
pub struct RxOrderCore {
    client: ApiClient,
    navigation: Arc<NavigationTrigger>,
    feed: Arc<Mutex<OrderFeed>>,
}

impl RxOrderCore {
    fn build(config: ClientConfig, session: SessionStore) -> Result<Arc<Self>, RxOrderError> {
        let navigation = Arc::new(NavigationTrigger::new());
        let feed = Arc::new(Mutex::new(OrderFeed::new()));

        // Whatever ends the session also drops the orders held for it.
        let on_session_expired: SessionExpiredCallback = {
            let navigation = Arc::clone(&navigation);
            let feed = Arc::clone(&feed);
            Arc::new(move || {
                lock_feed(&feed).reset();
                navigation.reset_to_login();
            })
        };

        let client = ApiClient::new(config, Arc::new(session), on_session_expired)?;
        Ok(Arc::new(Self {
            client,
            navigation,
            feed,
        }))
    }

    fn with_feed<T>(&self, f: impl FnOnce(&mut OrderFeed) -> T) -> T {
        let mut feed = lock_feed(&self.feed);
        f(&mut *feed)
    }
}

fn lock_feed(feed: &Mutex<OrderFeed>) -> MutexGuard<'_, OrderFeed> {
    feed.lock().unwrap_or_else(PoisonError::into_inner)
}

#[uniffi::export(async_runtime = "tokio")]
impl RxOrderCore {
    // =========================================================================
    // Auth Operations
    // =========================================================================

    /// Request an OTP for `phone` (international form).
    pub async fn login(&self, phone: String) -> Result<(), RxOrderError> {
        let payload = LoginPayload {
            phone,
            dev: self.client.config().dev_mode,
        };
        self.client.login(&payload).await?;
        Ok(())
    }

    /// Verify the OTP and store the issued token/user.
    pub async fn verify_otp(&self, phone: String, otp: String) -> Result<FfiSession, RxOrderError> {
        let payload = VerifyOtpPayload {
            phone,
            otp,
            dev: self.client.config().dev_mode,
        };
        self.client.verify_and_store(&payload).await?;
        Ok(self.client.session().snapshot().into())
    }

    /// Sign out, drop the held orders and reset navigation to the login
    /// screen.
    pub fn logout(&self) -> Result<(), RxOrderError> {
        self.client.logout()?;
        Ok(())
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    pub fn session(&self) -> FfiSession {
        self.client.session().snapshot().into()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Route name of the first screen after launch.
    pub fn initial_screen(&self) -> String {
        initial_screen(self.client.session()).route_name().to_string()
    }

    // =========================================================================
    // Navigation Operations
    // =========================================================================

    pub fn arm_navigation(&self, listener: Box<dyn NavigationListener>) {
        self.navigation.arm(Arc::new(ListenerNavigator(listener)));
    }

    pub fn disarm_navigation(&self) {
        self.navigation.disarm();
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    pub async fn get_orders(&self, page: Option<u32>) -> Result<FfiOrderPage, RxOrderError> {
        let page = self.client.get_orders(OrdersQuery { page }).await?;
        Ok(page.into())
    }

    pub async fn create_order(&self, draft: FfiOrderDraft) -> Result<FfiOrder, RxOrderError> {
        let order = self.client.create_order(&draft.into()).await?;
        Ok(order.into())
    }

    pub async fn update_order(
        &self,
        order_id: String,
        draft: FfiOrderDraft,
    ) -> Result<FfiOrder, RxOrderError> {
        let order = self.client.update_order(&order_id, &draft.into()).await?;
        Ok(order.into())
    }

    /// Fetch the next page into the held order list. Returns `false` when
    /// everything is already loaded.
    pub async fn load_more_orders(&self) -> Result<bool, RxOrderError> {
        let Some(request) = self.with_feed(|feed| feed.next_request()) else {
            return Ok(false);
        };
        let fetched = self.client.get_orders(OrdersQuery::page(request.page)).await?;
        Ok(self.with_feed(|feed| feed.accept(request, fetched)))
    }

    /// Drop the held order list and load its first page again.
    pub async fn refresh_orders(&self) -> Result<bool, RxOrderError> {
        self.with_feed(OrderFeed::reset);
        self.load_more_orders().await
    }

    /// Held orders matching `search` (blank keeps all).
    pub fn loaded_orders(&self, search: String) -> Vec<FfiOrder> {
        self.with_feed(|feed| {
            feed.search(&search)
                .into_iter()
                .cloned()
                .map(Into::into)
                .collect()
        })
    }

    pub fn has_more_orders(&self) -> bool {
        self.with_feed(|feed| feed.has_more())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe client configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub dev_mode: bool,
}

impl From<ClientConfig> for FfiClientConfig {
    fn from(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url,
            timeout_ms: config.timeout.as_millis() as u64,
            dev_mode: config.dev_mode,
        }
    }
}

impl From<FfiClientConfig> for ClientConfig {
    fn from(config: FfiClientConfig) -> Self {
        ClientConfig {
            base_url: config.base_url,
            timeout: Duration::from_millis(config.timeout_ms),
            dev_mode: config.dev_mode,
        }
    }
}

/// FFI-safe user profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUserProfile {
    pub id: String,
    pub user_type: String,
    pub name: String,
    pub phone: String,
}

impl From<UserProfile> for FfiUserProfile {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            user_type: user.user_type,
            name: user.name,
            phone: user.phone,
        }
    }
}

/// FFI-safe session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub token: Option<String>,
    pub user: Option<FfiUserProfile>,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user.map(Into::into),
        }
    }
}

/// FFI-safe order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOrder {
    pub id: String,
    pub display_id: String,
    pub status: String,
    pub status_color: String,
    pub status_background_color: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub doctor_name: String,
    pub patient_name: String,
    pub hospital_address: String,
    pub referral_name: Option<String>,
    pub coupon_code: Option<String>,
    pub prescription_urls: Vec<String>,
}

impl From<Order> for FfiOrder {
    fn from(order: Order) -> Self {
        Self {
            display_id: order.display_id(),
            status: order.status.label().to_string(),
            status_color: order.status.color().to_string(),
            status_background_color: order.status.background_color().to_string(),
            created_at: order.created_at.to_rfc3339(),
            id: order.id,
            doctor_name: order.doctor_name,
            patient_name: order.patient_name,
            hospital_address: order.hospital_address,
            referral_name: order.referral_name,
            coupon_code: order.coupon_code,
            prescription_urls: order.prescription_urls,
        }
    }
}

/// FFI-safe order page.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOrderPage {
    pub orders: Vec<FfiOrder>,
    pub pages: Option<u32>,
    pub total: Option<u64>,
}

impl From<OrderPage> for FfiOrderPage {
    fn from(page: OrderPage) -> Self {
        Self {
            orders: page.orders.into_iter().map(Into::into).collect(),
            pages: page.pages,
            total: page.total,
        }
    }
}

/// FFI-safe order form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOrderDraft {
    pub doctor_name: String,
    pub patient_name: String,
    pub hospital_address: String,
    pub referral_name: Option<String>,
    pub coupon_code: Option<String>,
    pub prescription_urls: Vec<String>,
}

impl From<FfiOrderDraft> for OrderDraft {
    fn from(draft: FfiOrderDraft) -> Self {
        OrderDraft {
            doctor_name: draft.doctor_name,
            patient_name: draft.patient_name,
            hospital_address: draft.hospital_address,
            referral_name: draft.referral_name,
            coupon_code: draft.coupon_code,
            prescription_urls: draft.prescription_urls,
        }
    }
}

/// FFI-safe order form errors.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiOrderDraftErrors {
    pub doctor: Option<String>,
    pub patient: Option<String>,
    pub hospital: Option<String>,
    pub image: Option<String>,
}

impl From<OrderDraftErrors> for FfiOrderDraftErrors {
    fn from(errors: OrderDraftErrors) -> Self {
        Self {
            doctor: errors.doctor,
            patient: errors.patient,
            hospital: errors.hospital,
            image: errors.image,
        }
    }
}
