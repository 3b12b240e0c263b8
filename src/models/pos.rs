use crate::entities::pos_session_entity as pos_sessions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{CustomerSummary, DealClaimResponse, DealSummary, VendorSummary};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    #[schema(example = "K7M2QX")]
    pub claim_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub claim: DealClaimResponse,
    pub customer: CustomerSummary,
    pub deal: DealSummary,
    pub vendor: VendorSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteTransactionRequest {
    pub claim_code: String,
    /// Final bill in paise, after the deal discount.
    pub bill_amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteTransactionResponse {
    pub claim_id: i64,
    pub deal_id: i64,
    pub customer_id: i64,
    pub bill_amount: i64,
    pub savings_amount: i64,
    pub used_at: DateTime<Utc>,
    pub pos_session_id: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    pub terminal_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PosSessionResponse {
    pub id: i64,
    pub vendor_id: i64,
    pub session_token: Uuid,
    pub terminal_id: Option<String>,
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_transactions: i32,
    pub total_amount: i64,
}

impl From<pos_sessions::Model> for PosSessionResponse {
    fn from(s: pos_sessions::Model) -> Self {
        Self {
            id: s.id,
            vendor_id: s.vendor_id,
            session_token: s.session_token,
            terminal_id: s.terminal_id,
            is_active: s.is_active,
            started_at: s.started_at,
            ended_at: s.ended_at,
            total_transactions: s.total_transactions,
            total_amount: s.total_amount,
        }
    }
}
