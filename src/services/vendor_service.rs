use crate::config::PinConfig;
use crate::entities::{
    ClaimStatus, UserRole, VendorStatus, deal_claim_entity as deal_claims, deal_entity as deals,
    user_entity as users, vendor_entity as vendors,
};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::admin_service::as_count;
use crate::services::deal_service::owned_deal;
use crate::utils::pin::{generate_pin, hash_pin};
use crate::utils::savings::verification_rate;
use crate::utils::RotatingPin;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

/// Maximum number of claim rows returned by the vendor dashboard.
const DASHBOARD_CLAIM_LIMIT: u64 = 500;

/// Vendor profile owned by `user_id`.
pub(crate) async fn vendor_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<vendors::Model> {
    vendors::Entity::find()
        .filter(vendors::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor profile not found".to_string()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_business_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if !(2..=200).contains(&len) {
        return Err(AppError::ValidationError(
            "Business name must be between 2 and 200 characters".to_string(),
        ));
    }
    Ok(())
}

/// Claim totals for one deal, computed in the database.
#[derive(Debug, FromQueryResult)]
pub(crate) struct DealClaimAggregate {
    deal_id: i64,
    total: i64,
    verified: i64,
    pending: i64,
    revenue: i64,
}

/// Dashboard summary over every claim of one vendor.
pub(crate) fn summarize_claims(per_deal: &[DealClaimAggregate]) -> ClaimSummary {
    let total_claims: u64 = per_deal.iter().map(|r| as_count(r.total)).sum();
    let verified_claims: u64 = per_deal.iter().map(|r| as_count(r.verified)).sum();
    let pending_claims: u64 = per_deal.iter().map(|r| as_count(r.pending)).sum();
    let total_revenue = per_deal.iter().map(|r| r.revenue).sum();

    ClaimSummary {
        total_claims,
        verified_claims,
        pending_claims,
        total_revenue,
        verification_rate: verification_rate(verified_claims, total_claims),
    }
}

#[derive(Clone)]
pub struct VendorService {
    pool: DbPool,
    rotating_pin: RotatingPin,
}

impl VendorService {
    pub fn new(pool: DbPool, pin_config: &PinConfig) -> Self {
        Self {
            pool,
            rotating_pin: RotatingPin::new(
                pin_config.rotation_interval_minutes,
                pin_config.rotation_secret.clone(),
            ),
        }
    }

    pub async fn register(
        &self,
        user: &AuthUser,
        request: RegisterVendorRequest,
    ) -> AppResult<VendorResponse> {
        user.require_role(&[UserRole::Vendor])?;
        validate_business_name(&request.business_name)?;

        let existing = vendors::Entity::find()
            .filter(vendors::Column::UserId.eq(user.id))
            .one(self.pool.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Vendor profile already exists for this user".to_string(),
            ));
        }

        let now = Utc::now();
        let vendor = vendors::ActiveModel {
            user_id: Set(user.id),
            business_name: Set(request.business_name.trim().to_string()),
            gst_number: Set(trimmed(request.gst_number)),
            pan_number: Set(trimmed(request.pan_number)),
            logo_url: Set(trimmed(request.logo_url)),
            description: Set(trimmed(request.description)),
            address: Set(trimmed(request.address)),
            city: Set(trimmed(request.city)),
            state: Set(trimmed(request.state)),
            latitude: Set(trimmed(request.latitude)),
            longitude: Set(trimmed(request.longitude)),
            store_type: Set(trimmed(request.store_type)),
            status: Set(VendorStatus::Pending),
            is_approved: Set(false),
            total_deals: Set(0),
            total_redemptions: Set(0),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Vendor profile {} registered by user {}", vendor.id, user.id);
        Ok(VendorResponse::from(vendor))
    }

    pub async fn me(&self, user: &AuthUser) -> AppResult<VendorResponse> {
        user.require_role(&[UserRole::Vendor])?;
        vendor_for_user(self.pool.as_ref(), user.id)
            .await
            .map(VendorResponse::from)
    }

    pub async fn update_profile(
        &self,
        user: &AuthUser,
        request: UpdateVendorRequest,
    ) -> AppResult<VendorResponse> {
        user.require_role(&[UserRole::Vendor])?;
        if let Some(name) = &request.business_name {
            validate_business_name(name)?;
        }

        let mut model = vendor_for_user(self.pool.as_ref(), user.id)
            .await?
            .into_active_model();

        if let Some(name) = request.business_name {
            model.business_name = Set(name.trim().to_string());
        }
        if let Some(v) = request.gst_number {
            model.gst_number = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.pan_number {
            model.pan_number = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.logo_url {
            model.logo_url = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.description {
            model.description = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.address {
            model.address = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.city {
            model.city = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.state {
            model.state = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.latitude {
            model.latitude = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.longitude {
            model.longitude = Set(trimmed(Some(v)));
        }
        if let Some(v) = request.store_type {
            model.store_type = Set(trimmed(Some(v)));
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(self.pool.as_ref()).await?;
        Ok(VendorResponse::from(updated))
    }

    pub async fn list_public(
        &self,
        query: &VendorListQuery,
    ) -> AppResult<PaginatedResponse<VendorResponse>> {
        let params = query.pagination();
        let mut select = vendors::Entity::find()
            .filter(vendors::Column::Status.eq(VendorStatus::Approved))
            .filter(vendors::Column::IsApproved.eq(true));

        if let Some(city) = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            select = select.filter(Expr::col(vendors::Column::City).ilike(city));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_asc(vendors::Column::BusinessName)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(VendorResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn claimed_deals_dashboard(&self, user: &AuthUser) -> AppResult<ClaimedDealsDashboard> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;

        let per_deal = deal_claims::Entity::find()
            .select_only()
            .column(deal_claims::Column::DealId)
            .column_as(Expr::cust("COUNT(*)"), "total")
            .column_as(Expr::cust("COUNT(*) FILTER (WHERE vendor_verified)"), "verified")
            .column_as(Expr::cust("COUNT(*) FILTER (WHERE status = 'pending')"), "pending")
            .column_as(Expr::cust("COALESCE(SUM(bill_amount), 0)::BIGINT"), "revenue")
            .filter(deal_claims::Column::VendorId.eq(vendor.id))
            .group_by(deal_claims::Column::DealId)
            .order_by_asc(deal_claims::Column::DealId)
            .into_model::<DealClaimAggregate>()
            .all(self.pool.as_ref())
            .await?;

        let summary = summarize_claims(&per_deal);

        let vendor_deals: HashMap<i64, deals::Model> = deals::Entity::find()
            .filter(deals::Column::VendorId.eq(vendor.id))
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        let deal_performance = per_deal
            .iter()
            .map(|r| DealPerformance {
                deal_id: r.deal_id,
                title: vendor_deals
                    .get(&r.deal_id)
                    .map(|d| d.title.clone())
                    .unwrap_or_default(),
                total_claims: as_count(r.total),
                verified_claims: as_count(r.verified),
                revenue: r.revenue,
            })
            .collect();

        // only the listed rows are capped
        let claims = deal_claims::Entity::find()
            .filter(deal_claims::Column::VendorId.eq(vendor.id))
            .order_by_desc(deal_claims::Column::ClaimedAt)
            .limit(DASHBOARD_CLAIM_LIMIT)
            .all(self.pool.as_ref())
            .await?;

        let customer_ids: Vec<i64> = claims.iter().map(|c| c.user_id).collect();
        let customers: HashMap<i64, users::Model> = if customer_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(customer_ids))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        let rows = claims
            .into_iter()
            .map(|c| {
                let customer = customers.get(&c.user_id);
                let deal = vendor_deals.get(&c.deal_id);
                VendorClaimRow {
                    claim_id: c.id,
                    claim_code: c.claim_code,
                    status: c.status,
                    claimed_at: c.claimed_at,
                    verified_at: c.verified_at,
                    used_at: c.used_at,
                    bill_amount: c.bill_amount,
                    savings_amount: c.savings_amount,
                    customer_id: c.user_id,
                    customer_name: customer.map(|u| u.name.clone()),
                    customer_email: customer.map(|u| u.email.clone()),
                    customer_phone: customer.and_then(|u| u.phone.clone()),
                    deal_id: c.deal_id,
                    deal_title: deal.map(|d| d.title.clone()),
                    discount_percentage: deal.map(|d| d.discount_percentage),
                }
            })
            .collect();

        Ok(ClaimedDealsDashboard {
            summary,
            claims: rows,
            deal_performance,
        })
    }

    pub async fn current_pin(&self, user: &AuthUser, deal_id: i64) -> AppResult<CurrentPinResponse> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;
        let deal = owned_deal(self.pool.as_ref(), vendor.id, deal_id).await?;

        let active_claims = deal_claims::Entity::find()
            .filter(deal_claims::Column::DealId.eq(deal.id))
            .filter(deal_claims::Column::Status.is_in(ClaimStatus::open()))
            .count(self.pool.as_ref())
            .await?;

        let state = self
            .rotating_pin
            .current(deal.id, &deal.verification_pin, Utc::now());

        Ok(CurrentPinResponse {
            deal_id: deal.id,
            deal_title: deal.title.clone(),
            current_pin: state.pin,
            static_pin: deal.visible_pin().map(str::to_string),
            pin_is_hashed: deal.pin_is_hashed(),
            window_started_at: state.window_started_at,
            next_rotation_at: state.next_rotation_at,
            rotation_interval_minutes: self.rotating_pin.interval_minutes(),
            active_claims,
        })
    }

    /// Issues a fresh PIN; the plaintext is only returned here.
    pub async fn regenerate_pin(
        &self,
        user: &AuthUser,
        deal_id: i64,
        request: RegeneratePinRequest,
    ) -> AppResult<RegeneratePinResponse> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;
        let deal = owned_deal(self.pool.as_ref(), vendor.id, deal_id).await?;

        let pin = generate_pin();
        let (stored, salt) = if request.secure {
            let (hashed, salt) = hash_pin(&pin)?;
            (hashed, Some(salt))
        } else {
            (pin.clone(), None)
        };

        let mut model = deal.into_active_model();
        model.verification_pin = Set(stored);
        model.pin_salt = Set(salt);
        model.updated_at = Set(Some(Utc::now()));
        let updated = model.update(self.pool.as_ref()).await?;

        log::info!("PIN regenerated for deal {} by vendor {}", updated.id, vendor.id);
        Ok(RegeneratePinResponse {
            deal_id: updated.id,
            pin,
            pin_is_hashed: request.secure,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::{CodeKind, MembershipPlan};
    use crate::services::claim_service::tests::customer;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn vendor_user() -> AuthUser {
        AuthUser {
            id: 5,
            email: "v@shop.in".into(),
            role: UserRole::Vendor,
        }
    }

    pub(crate) fn vendor_model(user_id: i64) -> vendors::Model {
        vendors::Model {
            id: 3,
            user_id,
            business_name: "Sharma Sweets".into(),
            gst_number: None,
            pan_number: None,
            logo_url: None,
            description: None,
            address: None,
            city: Some("Pune".into()),
            state: None,
            latitude: None,
            longitude: None,
            store_type: None,
            status: VendorStatus::Approved,
            is_approved: true,
            rejection_reason: None,
            total_deals: 1,
            total_redemptions: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn claim(status: ClaimStatus, verified: bool, bill: Option<i64>) -> deal_claims::Model {
        let now = Utc::now();
        deal_claims::Model {
            id: 1,
            deal_id: 10,
            user_id: 7,
            vendor_id: 3,
            claim_code: "K7M2QX".into(),
            code_kind: CodeKind::Unique,
            status,
            vendor_verified: verified,
            verified_at: None,
            bill_amount: bill,
            savings_amount: 0,
            claimed_at: now,
            expires_at: now + Duration::hours(24),
            used_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn aggregate(
        deal_id: i64,
        total: i64,
        verified: i64,
        pending: i64,
        revenue: i64,
    ) -> DealClaimAggregate {
        DealClaimAggregate {
            deal_id,
            total,
            verified,
            pending,
            revenue,
        }
    }

    fn aggregate_row(
        deal_id: i64,
        total: i64,
        verified: i64,
        pending: i64,
        revenue: i64,
    ) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("deal_id", Value::BigInt(Some(deal_id))),
            ("total", Value::BigInt(Some(total))),
            ("verified", Value::BigInt(Some(verified))),
            ("pending", Value::BigInt(Some(pending))),
            ("revenue", Value::BigInt(Some(revenue))),
        ])
    }

    #[test]
    fn test_summarize_claims() {
        let summary = summarize_claims(&[
            aggregate(10, 3, 2, 1, 80_000),
            aggregate(11, 1, 1, 0, 20_000),
        ]);
        assert_eq!(summary.total_claims, 4);
        assert_eq!(summary.verified_claims, 3);
        assert_eq!(summary.pending_claims, 1);
        assert_eq!(summary.total_revenue, 100_000);
        assert_eq!(summary.verification_rate, 75.0);

        let empty = summarize_claims(&[]);
        assert_eq!(empty.verification_rate, 0.0);
    }

    #[tokio::test]
    async fn test_dashboard_totals_cover_claims_beyond_listing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![
                aggregate_row(10, 600, 450, 100, 4_000_000),
                aggregate_row(11, 40, 40, 0, 1_000_000),
            ]])
            .append_query_results([vec![crate::entities::deals::tests::live_deal(Utc::now())]])
            .append_query_results([vec![claim(ClaimStatus::Used, true, Some(8_000))]])
            .append_query_results([vec![customer(MembershipPlan::Basic)]])
            .into_connection();
        let service = VendorService::new(db.into(), &PinConfig::default());

        let dashboard = service.claimed_deals_dashboard(&vendor_user()).await.unwrap();
        assert_eq!(dashboard.claims.len(), 1);
        assert_eq!(dashboard.summary.total_claims, 640);
        assert_eq!(dashboard.summary.verified_claims, 490);
        assert_eq!(dashboard.summary.pending_claims, 100);
        assert_eq!(dashboard.summary.total_revenue, 5_000_000);

        assert_eq!(dashboard.deal_performance.len(), 2);
        assert_eq!(dashboard.deal_performance[0].deal_id, 10);
        assert_eq!(dashboard.deal_performance[0].total_claims, 600);
        assert_eq!(dashboard.deal_performance[0].title, "Flat 20% on groceries");
        // deal 11 is not among the vendor's loaded deals
        assert_eq!(dashboard.deal_performance[1].title, "");
        assert_eq!(dashboard.claims[0].customer_name.as_deref(), Some("Customer"));
    }

    #[tokio::test]
    async fn test_register_requires_vendor_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = VendorService::new(db.into(), &PinConfig::default());
        let customer = AuthUser {
            role: UserRole::Customer,
            ..vendor_user()
        };
        let err = service
            .register(
                &customer,
                RegisterVendorRequest {
                    business_name: "Shop".into(),
                    gst_number: None,
                    pan_number: None,
                    logo_url: None,
                    description: None,
                    address: None,
                    city: None,
                    state: None,
                    latitude: None,
                    longitude: None,
                    store_type: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_register_rejects_second_profile() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .into_connection();
        let service = VendorService::new(db.into(), &PinConfig::default());
        let err = service
            .register(
                &vendor_user(),
                RegisterVendorRequest {
                    business_name: "Second Shop".into(),
                    gst_number: None,
                    pan_number: None,
                    logo_url: None,
                    description: None,
                    address: None,
                    city: None,
                    state: None,
                    latitude: None,
                    longitude: None,
                    store_type: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_current_pin_for_foreign_deal_is_forbidden() {
        let mut foreign = crate::entities::deals::tests::live_deal(Utc::now());
        foreign.vendor_id = 99;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![foreign]])
            .into_connection();
        let service = VendorService::new(db.into(), &PinConfig::default());
        let err = service.current_pin(&vendor_user(), 10).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
