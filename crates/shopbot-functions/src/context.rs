use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shopbot_core::ShopStorage;

pub const DEFAULT_USER: &str = "user123";

/// Store contact details returned by `get_store_info` and rendered into the
/// system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInfo {
    pub name: String,
    pub hours: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub website: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        Self {
            name: "WRTeam Sport Center".into(),
            hours: "Monday-Saturday: 9AM-9PM, Sunday: 10AM-6PM".into(),
            phone: "1-800-WRTEAM".into(),
            email: "support@wrteam.com".into(),
            address: "123 Sports Avenue, Athletic City, AC 12345".into(),
            website: "www.wrteam.com".into(),
        }
    }
}

/// Everything a business function needs besides its arguments.
#[derive(Clone)]
pub struct ShopContext {
    pub storage: Arc<dyn ShopStorage>,
    pub default_user: String,
    pub store: StoreInfo,
}

impl ShopContext {
    pub fn new(storage: Arc<dyn ShopStorage>) -> Self {
        Self {
            storage,
            default_user: DEFAULT_USER.to_string(),
            store: StoreInfo::default(),
        }
    }

    pub fn with_default_user(mut self, user_id: impl Into<String>) -> Self {
        self.default_user = user_id.into();
        self
    }

    pub fn with_store(mut self, store: StoreInfo) -> Self {
        self.store = store;
        self
    }

    /// The user a call acts for: the explicit argument, else the session user.
    pub fn user(&self, requested: Option<String>) -> String {
        requested
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| self.default_user.clone())
    }
}
