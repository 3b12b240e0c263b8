use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DealSummary;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddWishlistRequest {
    pub deal_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WishlistItem {
    pub id: i64,
    pub deal_id: i64,
    pub added_at: DateTime<Utc>,
    pub deal: Option<DealSummary>,
}
