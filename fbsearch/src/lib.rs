pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod mcp;
pub mod search;
pub mod stdio_service;
pub mod tools;
pub mod transport;
pub mod types;
pub mod web_top;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use config::{Config, SessionContext};
pub use error::SearchError;
pub use search::SearchClient;
pub use transport::{HttpTransport, Params, Transport};
pub use types::*;

/// Shared state of the HTTP and stdio surfaces.
#[derive(Clone, Debug)]
pub struct AppState {
    pub client: SearchClient<Arc<dyn Transport>>,
}

impl AppState {
    pub fn new(client: SearchClient<Arc<dyn Transport>>) -> Self {
        Self { client }
    }

    /// Wire an [`HttpTransport`] from `config`.
    pub fn from_config(config: &Config) -> error::Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        let client = SearchClient::new(transport, config.session.clone())
            .with_web_domain(config.web_domain.clone());
        Ok(Self::new(client))
    }
}
