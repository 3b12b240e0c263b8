use crate::entities::UserRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use super::PaginationParams;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectRequest {
    #[schema(example = "GST number could not be verified")]
    pub reason: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DealCounts {
    pub total: u64,
    pub active: u64,
    pub pending_approval: u64,
    pub rejected: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub total_users: u64,
    pub users_by_role: BTreeMap<String, u64>,
    pub vendors_by_status: BTreeMap<String, u64>,
    pub deals: DealCounts,
    pub claims_by_status: BTreeMap<String, u64>,
    /// Paise saved by customers across all completed claims.
    pub total_savings: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ClaimCodeSummary {
    pub total_claims: u64,
    pub verified_claims: u64,
    pub used_claims: u64,
    pub expired_claims: u64,
    pub total_savings: i64,
    /// Share of claims a vendor verified, in percent.
    pub verification_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorClaimPerformance {
    pub vendor_id: i64,
    pub business_name: String,
    pub total_claims: u64,
    pub verified_claims: u64,
    pub used_claims: u64,
    pub total_revenue: i64,
    pub verification_rate: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryClaimBreakdown {
    pub category: String,
    pub total_claims: u64,
    pub used_claims: u64,
    pub total_savings: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimCodeAnalytics {
    pub summary: ClaimCodeSummary,
    pub vendors: Vec<VendorClaimPerformance>,
    pub categories: Vec<CategoryClaimBreakdown>,
}

/// A claim code carried by open claims on more than one deal.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SharedClaimCode {
    pub claim_code: String,
    pub deal_ids: Vec<i64>,
    pub claim_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HashedPinDeal {
    pub deal_id: i64,
    pub vendor_id: i64,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DealCodeAudit {
    pub shared_codes: Vec<SharedClaimCode>,
    pub hashed_pin_deals: Vec<HashedPinDeal>,
}
