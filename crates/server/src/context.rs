//! Shared application state.

use std::sync::Arc;

use calbridge_core::{
    FeedPublisher, FeedTokenRepository, SubscriptionRegistry, SyncService, TransferService,
};
use calbridge_infra::DbManager;

/// Handles to every service the handlers need.
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<DbManager>,
    pub sync: Arc<SyncService>,
    pub transfer: Arc<TransferService>,
    pub publisher: Arc<FeedPublisher>,
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
    pub tokens: Arc<dyn FeedTokenRepository>,
}
