use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Sort order for mock API listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    /// Newest `lastModified` first
    #[default]
    LastModified,
    /// Most recently touched directory first
    Recent,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListParams {
    #[param(inline)]
    pub order: Option<ListOrder>,
}
