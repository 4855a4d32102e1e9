//! Read-only catalog entities: installed apps and configured assets.

use serde_json::Value;

use crate::sparse::entity;
use crate::{AppId, AssetId};

entity! {
    /// An installed app (integration) on the remote platform.
    #[derive(PartialEq)]
    "app" => pub struct App {
        pub id: Option<AppId>,
        pub name: String,
        /// Vendor-assigned app GUID.
        pub appid: String,
        pub app_version: String,
        pub description: String,
        pub directory: String,
        pub product_name: String,
        pub product_vendor: String,
        pub product_version_regex: String,
        pub publisher: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub python_version: String,
        pub release_tag: String,
        pub install_time: String,
        pub tags: Vec<String>,
        pub contributors: Vec<Value>,
        pub known_versions: Vec<String>,
        pub draft_mode: bool,
        pub custom_made: Option<bool>,
    }
}

entity! {
    /// A configured asset: an app instance bound to a product endpoint.
    #[derive(PartialEq)]
    "asset" => pub struct Asset {
        pub id: Option<AssetId>,
        pub name: String,
        pub description: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub app: Option<AppId>,
        pub apps: Vec<Value>,
        pub product_name: String,
        pub product_vendor: String,
        pub product_version: String,
        pub automation_broker: String,
        pub tags: Vec<String>,
        pub tenants: Vec<Value>,
        pub configuration: Value,
        pub action_whitelist: Value,
        pub validation: Value,
        pub concurrency_limit: Option<u64>,
        pub primary_voting: Option<u64>,
        pub secondary_voting: Option<u64>,
        pub effective_user: Option<u64>,
        pub disabled: Option<bool>,
        pub internal: Option<bool>,
        pub version: Value,
    }
}

impl App {
    /// Case-insensitive substring match against the app name.
    pub fn name_matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}
