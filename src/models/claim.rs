use crate::entities::{ClaimStatus, CodeKind, deal_claim_entity as deal_claims};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DealSummary;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    pub claim_id: i64,
    #[schema(example = "K7M2QX")]
    pub claim_code: String,
    pub code_kind: CodeKind,
    pub deal_id: i64,
    pub vendor_id: i64,
    pub customer_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<deal_claims::Model> for ClaimResponse {
    fn from(c: deal_claims::Model) -> Self {
        Self {
            claim_id: c.id,
            claim_code: c.claim_code,
            code_kind: c.code_kind,
            deal_id: c.deal_id,
            vendor_id: c.vendor_id,
            customer_id: c.user_id,
            expires_at: c.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemWithPinRequest {
    #[schema(example = "482913")]
    pub pin: String,
    /// Final bill in paise.
    pub bill_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealClaimResponse {
    pub id: i64,
    pub deal_id: i64,
    pub user_id: i64,
    pub vendor_id: i64,
    pub claim_code: String,
    pub code_kind: CodeKind,
    pub status: ClaimStatus,
    pub vendor_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub bill_amount: Option<i64>,
    pub savings_amount: i64,
    pub claimed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<deal_claims::Model> for DealClaimResponse {
    fn from(c: deal_claims::Model) -> Self {
        Self {
            id: c.id,
            deal_id: c.deal_id,
            user_id: c.user_id,
            vendor_id: c.vendor_id,
            claim_code: c.claim_code,
            code_kind: c.code_kind,
            status: c.status,
            vendor_verified: c.vendor_verified,
            verified_at: c.verified_at,
            bill_amount: c.bill_amount,
            savings_amount: c.savings_amount,
            claimed_at: c.claimed_at,
            expires_at: c.expires_at,
            used_at: c.used_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimHistoryItem {
    pub claim: DealClaimResponse,
    pub deal: Option<DealSummary>,
}
