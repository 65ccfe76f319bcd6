use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::services::webhook::WebhookDispatcher;
use crate::store::BookingStore;

pub struct AppState {
    pub store: Mutex<BookingStore>,
    pub config: AppConfig,
    pub webhooks: Arc<WebhookDispatcher>,
}
