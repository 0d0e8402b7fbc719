//! Provider data structure passed to resources and data sources

use crate::api::PrefectClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct PrefectProviderData {
    pub client: Arc<dyn PrefectClient>,
}

impl PrefectProviderData {
    pub fn new(client: Arc<dyn PrefectClient>) -> Self {
        Self { client }
    }
}
