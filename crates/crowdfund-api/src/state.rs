use std::sync::Arc;

use crowdfund_db::Database;

use crate::payment::PaymentGateway;
use crate::storage::Storage;
use crate::token::TokenService;
use crate::web::session::SessionSettings;
use crate::web::templates::Templates;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: TokenService,
    pub storage: Arc<Storage>,
    pub payments: Arc<dyn PaymentGateway>,
    pub templates: Arc<Templates>,
    pub sessions: SessionSettings,
}
