use crate::config::{ClaimCodeMode, ClaimConfig, PinConfig};
use crate::entities::{
    ClaimStatus, CodeKind, UserRole, VendorStatus, deal_claim_entity as deal_claims,
    deal_entity as deals, user_entity as users, vendor_entity as vendors,
};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::utils::pin::verify_static_pin;
use crate::utils::{RotatingPin, compute_savings, generate_claim_code};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

const MAX_CODE_ATTEMPTS: usize = 10;

/// Rejects deals a customer cannot take right now.
pub(crate) fn ensure_claimable(
    deal: &deals::Model,
    customer: &users::Model,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if !deal.is_active || !deal.is_approved || deal.is_rejected {
        return Err(AppError::ValidationError(
            "Deal is not available".to_string(),
        ));
    }
    if now < deal.valid_from {
        return Err(AppError::ValidationError("Deal has not started yet".to_string()));
    }
    if now >= deal.valid_until {
        return Err(AppError::ValidationError("Deal has expired".to_string()));
    }
    if deal.is_sold_out() {
        return Err(AppError::ValidationError(
            "Deal has reached its redemption limit".to_string(),
        ));
    }
    if customer.effective_plan(now) < deal.required_membership {
        return Err(AppError::ValidationError(format!(
            "This deal requires a {} membership",
            deal.required_membership
        )));
    }
    Ok(())
}

/// Counts one redemption against the deal, refusing when the limit is reached.
pub(crate) async fn record_redemption<C: ConnectionTrait>(
    db: &C,
    deal: &deals::Model,
    customer_id: i64,
    savings: i64,
) -> AppResult<()> {
    let now = Utc::now();
    let updated = deals::Entity::update_many()
        .col_expr(
            deals::Column::CurrentRedemptions,
            Expr::col(deals::Column::CurrentRedemptions).add(1),
        )
        .col_expr(deals::Column::UpdatedAt, Expr::value(now))
        .filter(deals::Column::Id.eq(deal.id))
        .filter(
            Condition::any()
                .add(deals::Column::MaxRedemptions.is_null())
                .add(
                    Expr::col(deals::Column::CurrentRedemptions)
                        .lt(Expr::col(deals::Column::MaxRedemptions)),
                ),
        )
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::ValidationError(
            "Deal has reached its redemption limit".to_string(),
        ));
    }

    vendors::Entity::update_many()
        .col_expr(
            vendors::Column::TotalRedemptions,
            Expr::col(vendors::Column::TotalRedemptions).add(1),
        )
        .filter(vendors::Column::Id.eq(deal.vendor_id))
        .exec(db)
        .await?;

    users::Entity::update_many()
        .col_expr(
            users::Column::TotalSavings,
            Expr::col(users::Column::TotalSavings).add(savings),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(now))
        .filter(users::Column::Id.eq(customer_id))
        .exec(db)
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct ClaimService {
    pool: DbPool,
    rotating_pin: RotatingPin,
    grace_windows: i64,
    claim_config: ClaimConfig,
}

impl ClaimService {
    pub fn new(pool: DbPool, pin_config: &PinConfig, claim_config: ClaimConfig) -> Self {
        Self {
            pool,
            rotating_pin: RotatingPin::new(
                pin_config.rotation_interval_minutes,
                pin_config.rotation_secret.clone(),
            ),
            grace_windows: pin_config.grace_windows,
            claim_config,
        }
    }

    async fn load_for_claim<C: ConnectionTrait>(
        &self,
        db: &C,
        customer_id: i64,
        deal_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<(deals::Model, users::Model)> {
        let (deal, vendor) = deals::Entity::find_by_id(deal_id)
            .find_also_related(vendors::Entity)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

        if !vendor.is_some_and(|v| v.status == VendorStatus::Approved) {
            return Err(AppError::ValidationError(
                "Deal is not available".to_string(),
            ));
        }

        let customer = users::Entity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        ensure_claimable(&deal, &customer, now)?;
        Ok((deal, customer))
    }

    /// PINs a customer may type in to redeem directly.
    ///
    /// The stored PIN always works. The rotating PIN only works while claim
    /// codes are unique: in `rotating_pin` mode it is the customer's own claim
    /// code and must go through vendor verification instead.
    pub(crate) fn accepts_counter_pin(
        &self,
        deal: &deals::Model,
        pin: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if verify_static_pin(pin, &deal.verification_pin, deal.pin_salt.as_deref()) {
            return true;
        }
        self.claim_config.code_mode == ClaimCodeMode::Unique
            && self.rotating_pin.matches(
                deal.id,
                &deal.verification_pin,
                pin,
                now,
                self.grace_windows,
            )
    }

    async fn unique_claim_code<C: ConnectionTrait>(&self, db: &C) -> AppResult<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_claim_code();
            let taken = deal_claims::Entity::find()
                .filter(deal_claims::Column::ClaimCode.eq(code.as_str()))
                .filter(deal_claims::Column::Status.is_in(ClaimStatus::open()))
                .count(db)
                .await?;
            if taken == 0 {
                return Ok(code);
            }
        }
        Err(AppError::InternalError(
            "Could not allocate a unique claim code".to_string(),
        ))
    }

    /// Reserves a deal for the customer and hands out the code the vendor verifies at the counter.
    pub async fn claim_with_code(&self, user: &AuthUser, deal_id: i64) -> AppResult<ClaimResponse> {
        user.require_role(&[UserRole::Customer])?;
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let (deal, customer) = self.load_for_claim(&txn, user.id, deal_id, now).await?;

        // pending claims past their expiry no longer count as open
        deal_claims::Entity::update_many()
            .col_expr(deal_claims::Column::Status, Expr::value(ClaimStatus::Expired.to_string()))
            .col_expr(deal_claims::Column::UpdatedAt, Expr::value(now))
            .filter(deal_claims::Column::UserId.eq(customer.id))
            .filter(deal_claims::Column::DealId.eq(deal.id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Pending))
            .filter(deal_claims::Column::ExpiresAt.lte(now))
            .exec(&txn)
            .await?;

        let open = deal_claims::Entity::find()
            .filter(deal_claims::Column::UserId.eq(customer.id))
            .filter(deal_claims::Column::DealId.eq(deal.id))
            .filter(deal_claims::Column::Status.is_in(ClaimStatus::open()))
            .count(&txn)
            .await?;
        if open > 0 {
            return Err(AppError::ValidationError(
                "You already have an active claim for this deal".to_string(),
            ));
        }

        let (claim_code, code_kind) = match self.claim_config.code_mode {
            ClaimCodeMode::Unique => (self.unique_claim_code(&txn).await?, CodeKind::Unique),
            ClaimCodeMode::RotatingPin => (
                self.rotating_pin
                    .current(deal.id, &deal.verification_pin, now)
                    .pin,
                CodeKind::RotatingPin,
            ),
        };

        let claim = deal_claims::ActiveModel {
            deal_id: Set(deal.id),
            user_id: Set(customer.id),
            vendor_id: Set(deal.vendor_id),
            claim_code: Set(claim_code),
            code_kind: Set(code_kind),
            status: Set(ClaimStatus::Pending),
            vendor_verified: Set(false),
            savings_amount: Set(0),
            claimed_at: Set(now),
            expires_at: Set(now + Duration::hours(self.claim_config.code_ttl_hours)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        users::Entity::update_many()
            .col_expr(
                users::Column::DealsClaimed,
                Expr::col(users::Column::DealsClaimed).add(1),
            )
            .filter(users::Column::Id.eq(customer.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!(
            "Claim {} created for deal {} by customer {}",
            claim.id,
            claim.deal_id,
            claim.user_id
        );
        Ok(ClaimResponse::from(claim))
    }

    /// Customer-side redemption using the PIN the vendor tells them at the counter.
    pub async fn redeem_with_pin(
        &self,
        user: &AuthUser,
        deal_id: i64,
        request: RedeemWithPinRequest,
    ) -> AppResult<DealClaimResponse> {
        user.require_role(&[UserRole::Customer])?;
        let pin = request.pin.trim();
        if pin.is_empty() {
            return Err(AppError::ValidationError("PIN is required".to_string()));
        }
        if request.bill_amount.is_some_and(|b| b <= 0) {
            return Err(AppError::ValidationError(
                "Bill amount must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let (deal, customer) = self.load_for_claim(&txn, user.id, deal_id, now).await?;

        let taken = deal_claims::Entity::find()
            .filter(deal_claims::Column::UserId.eq(customer.id))
            .filter(deal_claims::Column::DealId.eq(deal.id))
            .filter(
                Condition::any()
                    .add(
                        deal_claims::Column::Status
                            .is_in([ClaimStatus::Verified, ClaimStatus::Used]),
                    )
                    .add(
                        Condition::all()
                            .add(deal_claims::Column::Status.eq(ClaimStatus::Pending))
                            .add(deal_claims::Column::ExpiresAt.gt(now)),
                    ),
            )
            .count(&txn)
            .await?;
        if taken > 0 {
            return Err(AppError::ValidationError(
                "You have already claimed this deal".to_string(),
            ));
        }

        if !self.accepts_counter_pin(&deal, pin, now) {
            log::warn!("Wrong PIN for deal {} from customer {}", deal.id, customer.id);
            return Err(AppError::ValidationError("Invalid PIN".to_string()));
        }

        let savings = match request.bill_amount {
            Some(bill) => compute_savings(
                bill,
                deal.discount_percentage,
                deal.original_price,
                deal.discounted_price,
            )?,
            None => match (deal.original_price, deal.discounted_price) {
                (Some(original), Some(discounted)) if original > discounted => original - discounted,
                _ => 0,
            },
        };

        let claim = deal_claims::ActiveModel {
            deal_id: Set(deal.id),
            user_id: Set(customer.id),
            vendor_id: Set(deal.vendor_id),
            claim_code: Set(self.unique_claim_code(&txn).await?),
            code_kind: Set(CodeKind::VendorPin),
            status: Set(ClaimStatus::Used),
            vendor_verified: Set(true),
            verified_at: Set(Some(now)),
            bill_amount: Set(request.bill_amount),
            savings_amount: Set(savings),
            claimed_at: Set(now),
            expires_at: Set(now),
            used_at: Set(Some(now)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        record_redemption(&txn, &deal, customer.id, savings).await?;
        users::Entity::update_many()
            .col_expr(
                users::Column::DealsClaimed,
                Expr::col(users::Column::DealsClaimed).add(1),
            )
            .filter(users::Column::Id.eq(customer.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!(
            "Deal {} redeemed with vendor PIN by customer {}, savings {}",
            deal.id,
            customer.id,
            savings
        );
        Ok(DealClaimResponse::from(claim))
    }

    /// Marks pending claims past `expires_at` as expired.
    pub async fn expire_stale_claims(&self) -> AppResult<u64> {
        let now = Utc::now();
        let result = deal_claims::Entity::update_many()
            .col_expr(deal_claims::Column::Status, Expr::value(ClaimStatus::Expired.to_string()))
            .col_expr(deal_claims::Column::UpdatedAt, Expr::value(now))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Pending))
            .filter(deal_claims::Column::ExpiresAt.lte(now))
            .exec(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::{DbPool, count_row, statement_log};
    use crate::entities::MembershipPlan;
    use crate::entities::deals::tests::live_deal;
    use crate::services::vendor_service::tests::vendor_model;
    use crate::utils::code_generator::CLAIM_CODE_ALPHABET;
    use regex::Regex;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    pub(crate) fn customer(plan: MembershipPlan) -> users::Model {
        users::Model {
            id: 7,
            email: "c@example.com".into(),
            password_hash: String::new(),
            name: "Customer".into(),
            phone: None,
            role: UserRole::Customer,
            city: None,
            state: None,
            membership_plan: plan,
            membership_expires_at: None,
            total_savings: 0,
            deals_claimed: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    pub(crate) fn claim_model(code: &str, status: ClaimStatus) -> deal_claims::Model {
        let now = Utc::now();
        deal_claims::Model {
            id: 31,
            deal_id: 10,
            user_id: 7,
            vendor_id: 3,
            claim_code: code.into(),
            code_kind: CodeKind::Unique,
            status,
            vendor_verified: status != ClaimStatus::Pending,
            verified_at: None,
            bill_amount: None,
            savings_amount: 0,
            claimed_at: now,
            expires_at: now + Duration::hours(24),
            used_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub(crate) fn affected(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> ClaimService {
        ClaimService::new(db.into(), &PinConfig::default(), ClaimConfig::default())
    }

    fn service_in(mode: ClaimCodeMode, db: DbPool) -> ClaimService {
        ClaimService::new(
            db,
            &PinConfig::default(),
            ClaimConfig {
                code_mode: mode,
                ..ClaimConfig::default()
            },
        )
    }

    fn customer_user() -> AuthUser {
        AuthUser {
            id: 7,
            email: "c@example.com".into(),
            role: UserRole::Customer,
        }
    }

    /// Mock answering the deal and customer lookups every claim starts with.
    fn claimable_db() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(live_deal(Utc::now()), vendor_model(5))]])
            .append_query_results([vec![customer(MembershipPlan::Basic)]])
    }

    #[test]
    fn test_claimable_live_deal() {
        let now = Utc::now();
        assert!(ensure_claimable(&live_deal(now), &customer(MembershipPlan::Basic), now).is_ok());
    }

    #[test]
    fn test_unavailable_deals_are_rejected() {
        let now = Utc::now();
        let basic = customer(MembershipPlan::Basic);

        let mut inactive = live_deal(now);
        inactive.is_active = false;
        let mut rejected = live_deal(now);
        rejected.is_rejected = true;
        let mut expired = live_deal(now);
        expired.valid_until = now - Duration::minutes(1);
        let mut sold_out = live_deal(now);
        sold_out.max_redemptions = Some(5);
        sold_out.current_redemptions = 5;

        for deal in [inactive, rejected, expired, sold_out] {
            assert!(matches!(
                ensure_claimable(&deal, &basic, now),
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_membership_tier_gate() {
        let now = Utc::now();
        let mut deal = live_deal(now);
        deal.required_membership = MembershipPlan::Premium;

        assert!(ensure_claimable(&deal, &customer(MembershipPlan::Basic), now).is_err());
        assert!(ensure_claimable(&deal, &customer(MembershipPlan::Premium), now).is_ok());
        assert!(ensure_claimable(&deal, &customer(MembershipPlan::Ultimate), now).is_ok());

        let mut lapsed = customer(MembershipPlan::Ultimate);
        lapsed.membership_expires_at = Some(now - Duration::days(1));
        assert!(ensure_claimable(&deal, &lapsed, now).is_err());
    }

    #[tokio::test]
    async fn test_vendor_cannot_claim() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let vendor = AuthUser {
            id: 5,
            email: "v@shop.in".into(),
            role: UserRole::Vendor,
        };
        let err = service(db).claim_with_code(&vendor, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_redeem_rejects_non_positive_bill() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let user = AuthUser {
            id: 7,
            email: "c@example.com".into(),
            role: UserRole::Customer,
        };
        let err = service(db)
            .redeem_with_pin(
                &user,
                10,
                RedeemWithPinRequest {
                    pin: "482913".into(),
                    bill_amount: Some(0),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_rotating_claim_code_is_not_a_counter_pin() {
        let now = Utc::now();
        let deal = live_deal(now);
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let rotating = service_in(ClaimCodeMode::RotatingPin, empty());
        let code = rotating
            .rotating_pin
            .current(deal.id, &deal.verification_pin, now)
            .pin;
        if code != deal.verification_pin {
            assert!(!rotating.accepts_counter_pin(&deal, &code, now));
        }
        assert!(rotating.accepts_counter_pin(&deal, "482913", now));

        let unique = service_in(ClaimCodeMode::Unique, empty());
        assert!(unique.accepts_counter_pin(&deal, &code, now));
        assert!(unique.accepts_counter_pin(&deal, "482913", now));
        assert!(!unique.accepts_counter_pin(&deal, "48a913", now));
    }

    #[tokio::test]
    async fn test_redeem_refuses_customer_who_already_claimed() {
        let db = claimable_db()
            .append_query_results([vec![count_row(1)]])
            .into_connection();
        let err = service(db)
            .redeem_with_pin(
                &customer_user(),
                10,
                RedeemWithPinRequest {
                    pin: "482913".into(),
                    bill_amount: Some(80_000),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_redeem_with_stored_pin() {
        let mut used = claim_model("Q2W3E4", ClaimStatus::Used);
        used.code_kind = CodeKind::VendorPin;
        let db: DbPool = Arc::new(
            claimable_db()
                .append_query_results([vec![count_row(0)]])
                .append_query_results([vec![count_row(0)]])
                .append_query_results([vec![used]])
                .append_exec_results([affected(1), affected(1), affected(1), affected(1)])
                .into_connection(),
        );
        let svc = service_in(ClaimCodeMode::Unique, db.clone());
        let claim = svc
            .redeem_with_pin(
                &customer_user(),
                10,
                RedeemWithPinRequest {
                    pin: "482913".into(),
                    bill_amount: Some(80_000),
                },
            )
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Used);

        drop(svc);
        let log = statement_log(db);
        // 20% off an 800 rupee bill saves 200
        assert!(log.contains("BigInt(Some(20000))"));
        assert!(log.contains(r#"String(Some("vendor_pin"))"#));
    }

    #[tokio::test]
    async fn test_claim_rejects_second_open_claim() {
        let db = claimable_db()
            .append_exec_results([affected(0)])
            .append_query_results([vec![count_row(1)]])
            .into_connection();
        let err = service(db)
            .claim_with_code(&customer_user(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_unique_claim_stores_pending_code() {
        let db: DbPool = Arc::new(
            claimable_db()
                .append_exec_results([affected(0)])
                .append_query_results([vec![count_row(0)]])
                .append_query_results([vec![count_row(0)]])
                .append_query_results([vec![claim_model("K7M2QX", ClaimStatus::Pending)]])
                .append_exec_results([affected(1)])
                .into_connection(),
        );
        let svc = service_in(ClaimCodeMode::Unique, db.clone());
        let claim = svc.claim_with_code(&customer_user(), 10).await.unwrap();
        assert_eq!(claim.deal_id, 10);

        drop(svc);
        let log = statement_log(db);
        assert!(log.contains(r#"String(Some("pending"))"#));
        assert!(log.contains(r#"String(Some("unique"))"#));

        let code = Regex::new(r#"String\(Some\("([A-Z0-9]{6})"\)\)"#).unwrap();
        let stored: Vec<&str> = code
            .captures_iter(&log)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();
        assert!(!stored.is_empty());
        for value in stored {
            assert!(value.bytes().all(|b| CLAIM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_rotating_mode_claim_stores_current_pin() {
        let now = Utc::now();
        let deal = live_deal(now);
        let db: DbPool = Arc::new(
            claimable_db()
                .append_exec_results([affected(0)])
                .append_query_results([vec![count_row(0)]])
                .append_query_results([vec![claim_model("000000", ClaimStatus::Pending)]])
                .append_exec_results([affected(1)])
                .into_connection(),
        );
        let svc = service_in(ClaimCodeMode::RotatingPin, db.clone());
        let expected = svc
            .rotating_pin
            .current(deal.id, &deal.verification_pin, now)
            .pin;
        svc.claim_with_code(&customer_user(), 10).await.unwrap();

        drop(svc);
        let log = statement_log(db);
        assert!(log.contains(&format!(r#"String(Some("{expected}"))"#)));
        assert!(log.contains(r#"String(Some("rotating_pin"))"#));
    }
}
