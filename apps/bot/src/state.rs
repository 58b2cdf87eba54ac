use std::sync::Arc;

use crate::config::Config;
use crate::conversation::service::Conversation;
use crate::gateway::MessagingGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Single serialized writer of the user document.
    pub conversation: Arc<Conversation>,
    /// Outbound messaging, used to notify users after payment confirmation.
    pub gateway: Arc<dyn MessagingGateway>,
    pub config: Config,
}
