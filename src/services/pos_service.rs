use crate::entities::{
    ClaimStatus, UserRole, deal_claim_entity as deal_claims, deal_entity as deals,
    pos_session_entity as pos_sessions, user_entity as users, vendor_entity as vendors,
};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::claim_service::record_redemption;
use crate::services::vendor_service::vendor_for_user;
use crate::utils::{compute_savings, normalize_code};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct PosService {
    pool: DbPool,
}

impl PosService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn calling_vendor(&self, user: &AuthUser) -> AppResult<vendors::Model> {
        user.require_role(&[UserRole::Vendor])?;
        vendor_for_user(self.pool.as_ref(), user.id).await
    }

    /// Verifies a customer's claim code at the counter. A code verifies once.
    pub async fn verify_claim_code(
        &self,
        user: &AuthUser,
        request: VerifyCodeRequest,
    ) -> AppResult<VerifyCodeResponse> {
        let code = normalize_code(&request.claim_code);
        if code.is_empty() {
            return Err(AppError::ValidationError("Claim code is required".to_string()));
        }
        let vendor = self.calling_vendor(user).await?;

        let claim = deal_claims::Entity::find()
            .filter(deal_claims::Column::ClaimCode.eq(code.as_str()))
            .filter(deal_claims::Column::VendorId.eq(vendor.id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Pending))
            .order_by_asc(deal_claims::Column::ClaimedAt)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Claim code not found".to_string()))?;

        let now = Utc::now();
        if claim.is_expired(now) {
            deal_claims::Entity::update_many()
                .col_expr(
                    deal_claims::Column::Status,
                    Expr::value(ClaimStatus::Expired.to_string()),
                )
                .col_expr(deal_claims::Column::UpdatedAt, Expr::value(now))
                .filter(deal_claims::Column::Id.eq(claim.id))
                .filter(deal_claims::Column::Status.eq(ClaimStatus::Pending))
                .exec(self.pool.as_ref())
                .await?;
            return Err(AppError::ValidationError(
                "Claim code has expired".to_string(),
            ));
        }

        // only the request that flips pending -> verified wins
        let result = deal_claims::Entity::update_many()
            .col_expr(
                deal_claims::Column::Status,
                Expr::value(ClaimStatus::Verified.to_string()),
            )
            .col_expr(deal_claims::Column::VendorVerified, Expr::value(true))
            .col_expr(deal_claims::Column::VerifiedAt, Expr::value(now))
            .col_expr(deal_claims::Column::UpdatedAt, Expr::value(now))
            .filter(deal_claims::Column::Id.eq(claim.id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Pending))
            .exec(self.pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Claim code has already been used".to_string(),
            ));
        }

        let customer = users::Entity::find_by_id(claim.user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
        let deal = deals::Entity::find_by_id(claim.deal_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

        log::info!(
            "Claim {} verified by vendor {} for deal {}",
            claim.id,
            vendor.id,
            deal.id
        );

        let claim = deal_claims::Model {
            status: ClaimStatus::Verified,
            vendor_verified: true,
            verified_at: Some(now),
            updated_at: Some(now),
            ..claim
        };
        Ok(VerifyCodeResponse {
            claim: claim.into(),
            customer: customer.into(),
            deal: deal.into(),
            vendor: vendor.into(),
        })
    }

    /// Records the bill for a verified claim and settles all counters.
    pub async fn complete_transaction(
        &self,
        user: &AuthUser,
        request: CompleteTransactionRequest,
    ) -> AppResult<CompleteTransactionResponse> {
        if request.bill_amount <= 0 {
            return Err(AppError::ValidationError(
                "Bill amount must be positive".to_string(),
            ));
        }
        let code = normalize_code(&request.claim_code);
        if code.is_empty() {
            return Err(AppError::ValidationError("Claim code is required".to_string()));
        }
        let vendor = self.calling_vendor(user).await?;

        let claim = deal_claims::Entity::find()
            .filter(deal_claims::Column::ClaimCode.eq(code.as_str()))
            .filter(deal_claims::Column::VendorId.eq(vendor.id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Verified))
            .order_by_asc(deal_claims::Column::VerifiedAt)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No verified claim found for this code".to_string())
            })?;

        let deal = deals::Entity::find_by_id(claim.deal_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

        let savings = compute_savings(
            request.bill_amount,
            deal.discount_percentage,
            deal.original_price,
            deal.discounted_price,
        )?;
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let result = deal_claims::Entity::update_many()
            .col_expr(
                deal_claims::Column::Status,
                Expr::value(ClaimStatus::Used.to_string()),
            )
            .col_expr(deal_claims::Column::BillAmount, Expr::value(request.bill_amount))
            .col_expr(deal_claims::Column::SavingsAmount, Expr::value(savings))
            .col_expr(deal_claims::Column::UsedAt, Expr::value(now))
            .col_expr(deal_claims::Column::UpdatedAt, Expr::value(now))
            .filter(deal_claims::Column::Id.eq(claim.id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Verified))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Claim has already been completed".to_string(),
            ));
        }

        record_redemption(&txn, &deal, claim.user_id, savings).await?;

        let session = pos_sessions::Entity::find()
            .filter(pos_sessions::Column::VendorId.eq(vendor.id))
            .filter(pos_sessions::Column::IsActive.eq(true))
            .order_by_desc(pos_sessions::Column::StartedAt)
            .one(&txn)
            .await?;
        if let Some(session) = &session {
            pos_sessions::Entity::update_many()
                .col_expr(
                    pos_sessions::Column::TotalTransactions,
                    Expr::col(pos_sessions::Column::TotalTransactions).add(1),
                )
                .col_expr(
                    pos_sessions::Column::TotalAmount,
                    Expr::col(pos_sessions::Column::TotalAmount).add(request.bill_amount),
                )
                .filter(pos_sessions::Column::Id.eq(session.id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        log::info!(
            "Claim {} completed by vendor {}: bill {}, savings {}",
            claim.id,
            vendor.id,
            request.bill_amount,
            savings
        );

        Ok(CompleteTransactionResponse {
            claim_id: claim.id,
            deal_id: claim.deal_id,
            customer_id: claim.user_id,
            bill_amount: request.bill_amount,
            savings_amount: savings,
            used_at: now,
            pos_session_id: session.map(|s| s.id),
        })
    }

    /// Opens a POS session, closing any session the vendor left open.
    pub async fn start_session(
        &self,
        user: &AuthUser,
        request: StartSessionRequest,
    ) -> AppResult<PosSessionResponse> {
        let vendor = self.calling_vendor(user).await?;
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let closed = pos_sessions::Entity::update_many()
            .col_expr(pos_sessions::Column::IsActive, Expr::value(false))
            .col_expr(pos_sessions::Column::EndedAt, Expr::value(now))
            .filter(pos_sessions::Column::VendorId.eq(vendor.id))
            .filter(pos_sessions::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;
        if closed.rows_affected > 0 {
            log::info!(
                "Closed {} stale POS session(s) for vendor {}",
                closed.rows_affected,
                vendor.id
            );
        }

        let session = pos_sessions::ActiveModel {
            vendor_id: Set(vendor.id),
            session_token: Set(Uuid::new_v4()),
            terminal_id: Set(request
                .terminal_id
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())),
            is_active: Set(true),
            started_at: Set(now),
            total_transactions: Set(0),
            total_amount: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(PosSessionResponse::from(session))
    }

    pub async fn end_session(&self, user: &AuthUser, session_id: i64) -> AppResult<PosSessionResponse> {
        let vendor = self.calling_vendor(user).await?;

        let session = pos_sessions::Entity::find_by_id(session_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("POS session not found".to_string()))?;
        if session.vendor_id != vendor.id {
            return Err(AppError::Forbidden);
        }
        if !session.is_active {
            return Err(AppError::ValidationError(
                "POS session has already ended".to_string(),
            ));
        }

        let mut model: pos_sessions::ActiveModel = session.into();
        model.is_active = Set(false);
        model.ended_at = Set(Some(Utc::now()));
        let ended = model.update(self.pool.as_ref()).await?;
        Ok(PosSessionResponse::from(ended))
    }

    pub async fn list_sessions(
        &self,
        user: &AuthUser,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PosSessionResponse>> {
        let vendor = self.calling_vendor(user).await?;

        let select =
            pos_sessions::Entity::find().filter(pos_sessions::Column::VendorId.eq(vendor.id));
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(pos_sessions::Column::StartedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(PosSessionResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::statement_log;
    use crate::entities::MembershipPlan;
    use crate::entities::deals::tests::live_deal;
    use crate::services::claim_service::tests::{affected, claim_model, customer};
    use crate::services::vendor_service::tests::vendor_model;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn vendor_user() -> AuthUser {
        AuthUser {
            id: 5,
            email: "v@shop.in".into(),
            role: UserRole::Vendor,
        }
    }

    fn verify(code: &str) -> VerifyCodeRequest {
        VerifyCodeRequest {
            claim_code: code.into(),
        }
    }

    fn open_session() -> pos_sessions::Model {
        pos_sessions::Model {
            id: 21,
            vendor_id: 3,
            session_token: Uuid::new_v4(),
            terminal_id: Some("counter-1".into()),
            is_active: true,
            started_at: Utc::now(),
            ended_at: None,
            total_transactions: 0,
            total_amount: 0,
        }
    }

    #[tokio::test]
    async fn test_verify_requires_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = PosService::new(db.into())
            .verify_claim_code(
                &vendor_user(),
                VerifyCodeRequest {
                    claim_code: "   ".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_verify_unknown_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([Vec::<deal_claims::Model>::new()])
            .into_connection();
        let err = PosService::new(db.into())
            .verify_claim_code(
                &vendor_user(),
                VerifyCodeRequest {
                    claim_code: "zz99zz".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_requires_positive_bill() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = PosService::new(db.into())
            .complete_transaction(
                &vendor_user(),
                CompleteTransactionRequest {
                    claim_code: "K7M2QX".into(),
                    bill_amount: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_customer_cannot_open_pos_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let customer = AuthUser {
            role: UserRole::Customer,
            ..vendor_user()
        };
        let err = PosService::new(db.into())
            .start_session(&customer, StartSessionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_code_verifies_once() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![claim_model("K7M2QX", ClaimStatus::Pending)]])
            .append_query_results([vec![customer(MembershipPlan::Basic)]])
            .append_query_results([vec![live_deal(Utc::now())]])
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![claim_model("K7M2QX", ClaimStatus::Pending)]])
            .append_exec_results([affected(1), affected(0)])
            .into_connection();
        let service = PosService::new(db.into());

        let first = service
            .verify_claim_code(&vendor_user(), verify("k7m2qx"))
            .await
            .unwrap();
        assert_eq!(first.claim.status, ClaimStatus::Verified);
        assert!(first.claim.vendor_verified);
        assert_eq!(first.customer.id, 7);

        // a concurrent verifier already flipped the row
        let err = service
            .verify_claim_code(&vendor_user(), verify("K7M2QX"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_expired_code_is_marked_expired() {
        let mut stale = claim_model("K7M2QX", ClaimStatus::Pending);
        stale.expires_at = Utc::now() - Duration::minutes(1);
        let db: DbPool = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![vendor_model(5)]])
                .append_query_results([vec![stale]])
                .append_exec_results([affected(1)])
                .into_connection(),
        );
        let service = PosService::new(db.clone());
        let err = service
            .verify_claim_code(&vendor_user(), verify("K7M2QX"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);

        drop(service);
        let log = statement_log(db);
        assert!(log.contains(r#"String(Some("expired"))"#));
        assert!(!log.contains(r#"String(Some("verified"))"#));
    }

    #[tokio::test]
    async fn test_complete_transaction_settles_claim() {
        let db: DbPool = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![vendor_model(5)]])
                .append_query_results([vec![claim_model("K7M2QX", ClaimStatus::Verified)]])
                .append_query_results([vec![live_deal(Utc::now())]])
                .append_query_results([vec![open_session()]])
                .append_exec_results([
                    affected(1),
                    affected(1),
                    affected(1),
                    affected(1),
                    affected(1),
                ])
                .into_connection(),
        );
        let service = PosService::new(db.clone());
        let done = service
            .complete_transaction(
                &vendor_user(),
                CompleteTransactionRequest {
                    claim_code: "K7M2QX".into(),
                    bill_amount: 80_000,
                },
            )
            .await
            .unwrap();
        assert_eq!(done.claim_id, 31);
        assert_eq!(done.customer_id, 7);
        assert_eq!(done.savings_amount, 20_000);
        assert_eq!(done.pos_session_id, Some(21));

        drop(service);
        let log = statement_log(db);
        assert!(log.contains(r#"String(Some("used"))"#));
        assert!(log.contains("pos_sessions"));
        assert!(log.contains("BigInt(Some(80000))"));
    }

    #[tokio::test]
    async fn test_complete_requires_verified_claim() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([Vec::<deal_claims::Model>::new()])
            .into_connection();
        let err = PosService::new(db.into())
            .complete_transaction(
                &vendor_user(),
                CompleteTransactionRequest {
                    claim_code: "K7M2QX".into(),
                    bill_amount: 80_000,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_rejects_oversized_bill() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![claim_model("K7M2QX", ClaimStatus::Verified)]])
            .append_query_results([vec![live_deal(Utc::now())]])
            .into_connection();
        let err = PosService::new(db.into())
            .complete_transaction(
                &vendor_user(),
                CompleteTransactionRequest {
                    claim_code: "K7M2QX".into(),
                    bill_amount: i64::MAX,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
