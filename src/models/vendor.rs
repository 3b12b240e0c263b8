use crate::entities::{ClaimStatus, VendorStatus, vendor_entity as vendors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PaginationParams;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterVendorRequest {
    #[schema(example = "Sharma Sweets")]
    pub business_name: String,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    #[schema(example = "Pune")]
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub store_type: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateVendorRequest {
    pub business_name: Option<String>,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub store_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorResponse {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    pub gst_number: Option<String>,
    pub pan_number: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub store_type: Option<String>,
    pub status: VendorStatus,
    pub is_approved: bool,
    pub rejection_reason: Option<String>,
    pub total_deals: i32,
    pub total_redemptions: i32,
    pub created_at: DateTime<Utc>,
}

impl From<vendors::Model> for VendorResponse {
    fn from(v: vendors::Model) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            business_name: v.business_name,
            gst_number: v.gst_number,
            pan_number: v.pan_number,
            logo_url: v.logo_url,
            description: v.description,
            address: v.address,
            city: v.city,
            state: v.state,
            latitude: v.latitude,
            longitude: v.longitude,
            store_type: v.store_type,
            status: v.status,
            is_approved: v.is_approved,
            rejection_reason: v.rejection_reason,
            total_deals: v.total_deals,
            total_redemptions: v.total_redemptions,
            created_at: v.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Public vendor card attached to deals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorSummary {
    pub id: i64,
    pub business_name: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl From<vendors::Model> for VendorSummary {
    fn from(v: vendors::Model) -> Self {
        Self {
            id: v.id,
            business_name: v.business_name,
            logo_url: v.logo_url,
            address: v.address,
            city: v.city,
            state: v.state,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VendorListQuery {
    pub city: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl VendorListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimSummary {
    pub total_claims: u64,
    pub verified_claims: u64,
    pub pending_claims: u64,
    /// Sum of completed bills, in paise.
    pub total_revenue: i64,
    /// Percentage of claims that reached verification, 0..=100.
    pub verification_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorClaimRow {
    pub claim_id: i64,
    pub claim_code: String,
    pub status: ClaimStatus,
    pub claimed_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub bill_amount: Option<i64>,
    pub savings_amount: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub deal_id: i64,
    pub deal_title: Option<String>,
    pub discount_percentage: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DealPerformance {
    pub deal_id: i64,
    pub title: String,
    pub total_claims: u64,
    pub verified_claims: u64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimedDealsDashboard {
    pub summary: ClaimSummary,
    pub claims: Vec<VendorClaimRow>,
    pub deal_performance: Vec<DealPerformance>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentPinResponse {
    pub deal_id: i64,
    pub deal_title: String,
    pub current_pin: String,
    /// Stored plaintext PIN; `null` when the PIN is hashed.
    pub static_pin: Option<String>,
    pub pin_is_hashed: bool,
    pub window_started_at: DateTime<Utc>,
    pub next_rotation_at: DateTime<Utc>,
    pub rotation_interval_minutes: i64,
    pub active_claims: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RegeneratePinRequest {
    /// Store the new PIN as a salted hash.
    #[serde(default)]
    pub secure: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegeneratePinResponse {
    pub deal_id: i64,
    /// Shown once; hashed PINs cannot be displayed again.
    pub pin: String,
    pub pin_is_hashed: bool,
}
