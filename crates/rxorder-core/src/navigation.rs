//! Navigation trigger for resets initiated outside the screens.
//!
//! The UI arms the trigger with a [`Navigator`] once its navigation tree has
//! mounted. Until then every reset is a silent no-op.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::http::SessionExpiredCallback;
use crate::session::SessionStore;

/// Screens known to the app's navigation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Splash,
    Login,
    VerifyOtp,
    Tabs,
    Home,
    Order,
    OrderDetails,
    CreateOrder,
    UploadPrescription,
    Support,
    Profile,
}

impl Screen {
    /// Route name registered with the UI navigator.
    pub fn route_name(&self) -> &'static str {
        match self {
            Screen::Splash => "Splash",
            Screen::Login => "Login",
            Screen::VerifyOtp => "VerifyOtp",
            Screen::Tabs => "Tabs",
            Screen::Home => "Home",
            Screen::Order => "Order",
            Screen::OrderDetails => "OrderDetails",
            Screen::CreateOrder => "CreateOrder",
            Screen::UploadPrescription => "UploadPrescription",
            Screen::Support => "Support",
            Screen::Profile => "Profile",
        }
    }
}

/// UI-side handle able to replace the whole navigation stack.
pub trait Navigator: Send + Sync {
    /// Replace the stack with `routes`, discarding all history.
    fn reset(&self, routes: &[Screen]);
}

#[derive(Default)]
pub struct NavigationTrigger {
    navigator: RwLock<Option<Arc<dyn Navigator>>>,
}

impl NavigationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self, navigator: Arc<dyn Navigator>) {
        *self.navigator.write().unwrap_or_else(PoisonError::into_inner) = Some(navigator);
        debug!("navigation trigger armed");
    }

    pub fn disarm(&self) {
        *self.navigator.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_armed(&self) -> bool {
        self.navigator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Reset the stack to `screen` as its only entry. Returns whether a
    /// navigator received the reset.
    pub fn reset_to(&self, screen: Screen) -> bool {
        let navigator = self
            .navigator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match navigator {
            Some(navigator) => {
                navigator.reset(&[screen]);
                true
            }
            None => {
                debug!(screen = screen.route_name(), "navigation reset ignored, not armed");
                false
            }
        }
    }

    pub fn reset_to_login(&self) -> bool {
        self.reset_to(Screen::Login)
    }

    /// Callback for [`ApiClient`](crate::http::ApiClient) that sends the user
    /// back to the login screen.
    pub fn session_expired_callback(self: &Arc<Self>) -> SessionExpiredCallback {
        let trigger = Arc::clone(self);
        Arc::new(move || {
            trigger.reset_to_login();
        })
    }
}

/// First screen after launch: the main tabs when a token is held, login
/// otherwise.
pub fn initial_screen(session: &SessionStore) -> Screen {
    let has_token = match session.stored_token() {
        Ok(Some(_)) => true,
        Ok(None) => session.is_authenticated(),
        Err(e) => {
            warn!(error = %e, "credential check failed");
            false
        }
    };
    if has_token {
        Screen::Tabs
    } else {
        Screen::Login
    }
}
