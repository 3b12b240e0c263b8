use crate::entities::{
    DealType, MembershipPlan, UserRole, VendorStatus, deal_claim_entity as deal_claims,
    deal_entity as deals, vendor_entity as vendors,
};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::services::vendor_service::vendor_for_user;
use crate::utils::pin::{generate_pin, hash_pin, validate_vendor_pin};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

/// Deal `deal_id`, which must belong to `vendor_id`.
pub(crate) async fn owned_deal<C: ConnectionTrait>(
    db: &C,
    vendor_id: i64,
    deal_id: i64,
) -> AppResult<deals::Model> {
    let deal = deals::Entity::find_by_id(deal_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;
    if deal.vendor_id != vendor_id {
        return Err(AppError::Forbidden);
    }
    Ok(deal)
}

/// Field rules shared by create and update, checked on the merged values.
pub(crate) struct DealFields<'a> {
    pub title: &'a str,
    pub discount_percentage: i32,
    pub original_price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub max_redemptions: Option<i32>,
}

pub(crate) fn validate_deal_fields(fields: &DealFields<'_>, now: DateTime<Utc>) -> AppResult<()> {
    let title_len = fields.title.trim().chars().count();
    if !(3..=200).contains(&title_len) {
        return Err(AppError::ValidationError(
            "Title must be between 3 and 200 characters".to_string(),
        ));
    }
    if !(1..=99).contains(&fields.discount_percentage) {
        return Err(AppError::ValidationError(
            "Discount percentage must be between 1 and 99".to_string(),
        ));
    }
    if fields.valid_until <= fields.valid_from {
        return Err(AppError::ValidationError(
            "valid_until must be after valid_from".to_string(),
        ));
    }
    if fields.valid_until <= now {
        return Err(AppError::ValidationError(
            "valid_until must be in the future".to_string(),
        ));
    }
    if fields.original_price.is_some_and(|p| p < 0) || fields.discounted_price.is_some_and(|p| p < 0)
    {
        return Err(AppError::ValidationError(
            "Prices must not be negative".to_string(),
        ));
    }
    if let (Some(original), Some(discounted)) = (fields.original_price, fields.discounted_price) {
        if discounted > original {
            return Err(AppError::ValidationError(
                "Discounted price must not exceed the original price".to_string(),
            ));
        }
    }
    if fields.max_redemptions.is_some_and(|m| m < 1) {
        return Err(AppError::ValidationError(
            "max_redemptions must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Visible on the public detail page: the deal is live and its vendor is approved.
pub(crate) fn publicly_visible(
    deal: &deals::Model,
    vendor: Option<&vendors::Model>,
    now: DateTime<Utc>,
) -> bool {
    deal.is_live(now) && vendor.is_some_and(|v| v.status == VendorStatus::Approved)
}

/// Whether an edit must go back through moderation. Switching an inactive
/// deal back on counts, as does any change to reviewed content.
pub(crate) fn needs_review(request: &UpdateDealRequest, deal: &deals::Model) -> bool {
    request.changes_content() || (request.is_active == Some(true) && !deal.is_active)
}

#[derive(Clone)]
pub struct DealService {
    pool: DbPool,
}

impl DealService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        request: CreateDealRequest,
    ) -> AppResult<CreateDealResponse> {
        user.require_role(&[UserRole::Vendor])?;
        let now = Utc::now();
        let valid_from = request.valid_from.unwrap_or(now);

        validate_deal_fields(
            &DealFields {
                title: &request.title,
                discount_percentage: request.discount_percentage,
                original_price: request.original_price,
                discounted_price: request.discounted_price,
                valid_from,
                valid_until: request.valid_until,
                max_redemptions: request.max_redemptions,
            },
            now,
        )?;
        if request.category.trim().is_empty() {
            return Err(AppError::ValidationError("Category is required".to_string()));
        }

        let pin = match request.verification_pin.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => {
                validate_vendor_pin(p)?;
                p.to_string()
            }
            _ => generate_pin(),
        };
        let (stored_pin, pin_salt) = if request.secure_pin {
            let (hashed, salt) = hash_pin(&pin)?;
            (hashed, Some(salt))
        } else {
            (pin.clone(), None)
        };

        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;
        if vendor.status != VendorStatus::Approved || !vendor.is_approved {
            return Err(AppError::ValidationError(
                "Vendor must be approved before creating deals".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;
        let deal = deals::ActiveModel {
            vendor_id: Set(vendor.id),
            title: Set(request.title.trim().to_string()),
            description: Set(request.description),
            category: Set(request.category.trim().to_lowercase()),
            image_url: Set(request.image_url),
            deal_type: Set(request.deal_type.unwrap_or(DealType::Offline)),
            discount_percentage: Set(request.discount_percentage),
            discount_code: Set(request.discount_code),
            original_price: Set(request.original_price),
            discounted_price: Set(request.discounted_price),
            valid_from: Set(valid_from),
            valid_until: Set(request.valid_until),
            max_redemptions: Set(request.max_redemptions),
            current_redemptions: Set(0),
            required_membership: Set(request
                .required_membership
                .unwrap_or(MembershipPlan::Basic)),
            is_active: Set(true),
            is_approved: Set(false),
            is_rejected: Set(false),
            verification_pin: Set(stored_pin),
            pin_salt: Set(pin_salt),
            view_count: Set(0),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        vendors::Entity::update_many()
            .col_expr(
                vendors::Column::TotalDeals,
                Expr::col(vendors::Column::TotalDeals).add(1),
            )
            .filter(vendors::Column::Id.eq(vendor.id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!("Deal {} created by vendor {}, awaiting approval", deal.id, vendor.id);
        let pin_is_hashed = deal.pin_is_hashed();
        Ok(CreateDealResponse {
            deal: deal.into(),
            verification_pin: pin,
            pin_is_hashed,
        })
    }

    pub async fn update(
        &self,
        user: &AuthUser,
        deal_id: i64,
        request: UpdateDealRequest,
    ) -> AppResult<VendorDealResponse> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;
        let deal = owned_deal(self.pool.as_ref(), vendor.id, deal_id).await?;
        let now = Utc::now();

        let title = request.title.as_deref().unwrap_or(&deal.title);
        let valid_from = request.valid_from.unwrap_or(deal.valid_from);
        let valid_until = request.valid_until.unwrap_or(deal.valid_until);
        let resubmit = needs_review(&request, &deal);
        if resubmit {
            validate_deal_fields(
                &DealFields {
                    title,
                    discount_percentage: request
                        .discount_percentage
                        .unwrap_or(deal.discount_percentage),
                    original_price: request.original_price.or(deal.original_price),
                    discounted_price: request.discounted_price.or(deal.discounted_price),
                    valid_from,
                    valid_until,
                    max_redemptions: request.max_redemptions.or(deal.max_redemptions),
                },
                now,
            )?;
        }

        let was_approved = deal.is_approved;
        let mut model = deal.into_active_model();
        if let Some(v) = request.title {
            model.title = Set(v.trim().to_string());
        }
        if let Some(v) = request.description {
            model.description = Set(v);
        }
        if let Some(v) = request.category {
            model.category = Set(v.trim().to_lowercase());
        }
        if let Some(v) = request.image_url {
            model.image_url = Set(Some(v));
        }
        if let Some(v) = request.deal_type {
            model.deal_type = Set(v);
        }
        if let Some(v) = request.discount_percentage {
            model.discount_percentage = Set(v);
        }
        if let Some(v) = request.discount_code {
            model.discount_code = Set(Some(v));
        }
        if let Some(v) = request.original_price {
            model.original_price = Set(Some(v));
        }
        if let Some(v) = request.discounted_price {
            model.discounted_price = Set(Some(v));
        }
        if request.valid_from.is_some() {
            model.valid_from = Set(valid_from);
        }
        if request.valid_until.is_some() {
            model.valid_until = Set(valid_until);
        }
        if let Some(v) = request.max_redemptions {
            model.max_redemptions = Set(Some(v));
        }
        if let Some(v) = request.required_membership {
            model.required_membership = Set(v);
        }
        if let Some(v) = request.is_active {
            model.is_active = Set(v);
        }
        // edited or re-enabled deals go back through moderation
        if resubmit {
            model.is_approved = Set(false);
            model.is_rejected = Set(false);
            model.rejection_reason = Set(None);
            model.approved_by = Set(None);
        }
        model.updated_at = Set(Some(now));

        let updated = model.update(self.pool.as_ref()).await?;
        if resubmit && was_approved {
            log::info!("Deal {} edited, returned to pending approval", updated.id);
        }
        Ok(VendorDealResponse::from(updated))
    }

    pub async fn delete(&self, user: &AuthUser, deal_id: i64) -> AppResult<DeleteDealResponse> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;
        let deal = owned_deal(self.pool.as_ref(), vendor.id, deal_id).await?;

        let claims = deal_claims::Entity::find()
            .filter(deal_claims::Column::DealId.eq(deal.id))
            .count(self.pool.as_ref())
            .await?;

        // claims keep their history, so the deal is only switched off
        if claims > 0 {
            let mut model = deal.into_active_model();
            model.is_active = Set(false);
            model.updated_at = Set(Some(Utc::now()));
            model.update(self.pool.as_ref()).await?;
            return Ok(DeleteDealResponse {
                deal_id,
                soft_deleted: true,
            });
        }

        let txn = self.pool.begin().await?;
        deal.delete(&txn).await?;
        vendors::Entity::update_many()
            .col_expr(
                vendors::Column::TotalDeals,
                Expr::cust("GREATEST(total_deals - 1, 0)"),
            )
            .filter(vendors::Column::Id.eq(vendor.id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(DeleteDealResponse {
            deal_id,
            soft_deleted: false,
        })
    }

    pub async fn list_vendor_deals(
        &self,
        user: &AuthUser,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<VendorDealResponse>> {
        user.require_role(&[UserRole::Vendor])?;
        let vendor = vendor_for_user(self.pool.as_ref(), user.id).await?;

        let select = deals::Entity::find().filter(deals::Column::VendorId.eq(vendor.id));
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(deals::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(VendorDealResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn list_public(
        &self,
        query: &DealListQuery,
    ) -> AppResult<PaginatedResponse<PublicDealItem>> {
        let params = query.pagination();
        let now = Utc::now();

        let mut select = deals::Entity::find()
            .inner_join(vendors::Entity)
            .filter(deals::Column::IsActive.eq(true))
            .filter(deals::Column::IsApproved.eq(true))
            .filter(deals::Column::IsRejected.eq(false))
            .filter(deals::Column::ValidFrom.lte(now))
            .filter(deals::Column::ValidUntil.gt(now))
            .filter(vendors::Column::Status.eq(VendorStatus::Approved));

        if let Some(category) = non_blank(&query.category) {
            select = select.filter(deals::Column::Category.eq(category.to_lowercase()));
        }
        if let Some(city) = non_blank(&query.city) {
            select = select.filter(Expr::col((vendors::Entity, vendors::Column::City)).ilike(city));
        }
        if let Some(search) = non_blank(&query.search) {
            let pattern = format!("%{}%", escape_like(search));
            select = select.filter(
                Condition::any()
                    .add(Expr::col((deals::Entity, deals::Column::Title)).ilike(pattern.as_str()))
                    .add(
                        Expr::col((deals::Entity, deals::Column::Description))
                            .ilike(pattern.as_str()),
                    ),
            );
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .select_also(vendors::Entity)
            .order_by_desc(deals::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .filter_map(|(deal, vendor)| {
                vendor.map(|v| PublicDealItem {
                    deal: deal.into(),
                    vendor: v.into(),
                })
            })
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// Public deal detail; counts the view.
    pub async fn get_public(&self, deal_id: i64) -> AppResult<DealDetailResponse> {
        let (deal, vendor) = deals::Entity::find_by_id(deal_id)
            .find_also_related(vendors::Entity)
            .one(self.pool.as_ref())
            .await?
            .filter(|(d, v)| publicly_visible(d, v.as_ref(), Utc::now()))
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

        deals::Entity::update_many()
            .col_expr(
                deals::Column::ViewCount,
                Expr::col(deals::Column::ViewCount).add(1),
            )
            .filter(deals::Column::Id.eq(deal.id))
            .exec(self.pool.as_ref())
            .await?;

        let mut response = DealResponse::from(deal);
        response.view_count += 1;
        Ok(DealDetailResponse {
            deal: response,
            vendor: vendor.map(VendorSummary::from),
        })
    }

    /// Switches off deals whose validity window has closed.
    pub async fn deactivate_expired_deals(&self) -> AppResult<u64> {
        let result = deals::Entity::update_many()
            .col_expr(deals::Column::IsActive, Expr::value(false))
            .col_expr(deals::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(deals::Column::IsActive.eq(true))
            .filter(deals::Column::ValidUntil.lte(Utc::now()))
            .exec(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{count_row, statement_log};
    use crate::entities::deals::tests::live_deal;
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
    fn fields(now: DateTime<Utc>) -> DealFields<'static> {
        DealFields {
            title: "Buy one get one",
            discount_percentage: 50,
            original_price: Some(40_000),
            discounted_price: Some(20_000),
            valid_from: now,
            valid_until: now + Duration::days(10),
            max_redemptions: Some(100),
        }
    }

    #[test]
    fn test_valid_deal_fields() {
        let now = Utc::now();
        assert!(validate_deal_fields(&fields(now), now).is_ok());
    }

    #[test]
    fn test_deal_field_rules() {
        let now = Utc::now();
        let cases = [
            DealFields {
                title: "ab",
                ..fields(now)
            },
            DealFields {
                discount_percentage: 0,
                ..fields(now)
            },
            DealFields {
                discount_percentage: 100,
                ..fields(now)
            },
            DealFields {
                valid_from: now - Duration::days(2),
                valid_until: now - Duration::hours(1),
                ..fields(now)
            },
            DealFields {
                valid_until: now,
                ..fields(now)
            },
            DealFields {
                original_price: Some(-1),
                discounted_price: None,
                ..fields(now)
            },
            DealFields {
                discounted_price: Some(50_000),
                ..fields(now)
            },
            DealFields {
                max_redemptions: Some(0),
                ..fields(now)
            },
        ];
        for case in &cases {
            assert!(matches!(
                validate_deal_fields(case, now),
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[tokio::test]
    async fn test_public_detail_of_missing_deal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<deals::Model>::new()])
            .into_connection();
        let err = DealService::new(db.into()).get_public(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_customer_cannot_create_deal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let now = Utc::now();
        let err = DealService::new(db.into())
            .create(
                &AuthUser {
                    id: 1,
                    email: "c@x.in".into(),
                    role: UserRole::Customer,
                },
                CreateDealRequest {
                    title: "Deal".into(),
                    description: "d".into(),
                    category: "food".into(),
                    image_url: None,
                    deal_type: None,
                    discount_percentage: 10,
                    discount_code: None,
                    original_price: None,
                    discounted_price: None,
                    valid_from: None,
                    valid_until: now + Duration::days(1),
                    max_redemptions: None,
                    required_membership: None,
                    verification_pin: None,
                    secure_pin: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn test_public_visibility_requires_approved_vendor() {
        let now = Utc::now();
        let deal = live_deal(now);
        let mut vendor = vendor_model(5);
        assert!(publicly_visible(&deal, Some(&vendor), now));
        assert!(!publicly_visible(&deal, None, now));

        vendor.status = VendorStatus::Suspended;
        assert!(!publicly_visible(&deal, Some(&vendor), now));
    }

    #[tokio::test]
    async fn test_public_detail_hides_suspended_vendor() {
        let mut vendor = vendor_model(5);
        vendor.status = VendorStatus::Suspended;
        let db: DbPool = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![(live_deal(Utc::now()), vendor)]])
                .into_connection(),
        );
        let service = DealService::new(db.clone());
        let err = service.get_public(10).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        drop(service);
        // the view counter is left alone
        assert!(!statement_log(db).contains("UPDATE"));
    }

    #[test]
    fn test_reactivation_needs_review() {
        let now = Utc::now();
        let mut inactive = live_deal(now);
        inactive.is_active = false;
        let enable = UpdateDealRequest {
            is_active: Some(true),
            ..Default::default()
        };
        let disable = UpdateDealRequest {
            is_active: Some(false),
            ..Default::default()
        };

        assert!(needs_review(&enable, &inactive));
        assert!(!needs_review(&enable, &live_deal(now)));
        assert!(!needs_review(&disable, &live_deal(now)));
        assert!(needs_review(
            &UpdateDealRequest {
                title: Some("Flat 25% on groceries".into()),
                ..Default::default()
            },
            &live_deal(now)
        ));
    }

    #[tokio::test]
    async fn test_reactivating_expired_deal_is_rejected() {
        let now = Utc::now();
        let mut expired = live_deal(now);
        expired.is_active = false;
        expired.valid_until = now - Duration::hours(1);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![vendor_model(5)]])
            .append_query_results([vec![expired]])
            .into_connection();

        let err = DealService::new(db.into())
            .update(
                &vendor_user(),
                10,
                UpdateDealRequest {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_vendor_deal_list_is_scoped_to_caller() {
        let db: DbPool = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![vendor_model(5)]])
                .append_query_results([vec![count_row(1)]])
                .append_query_results([vec![live_deal(Utc::now())]])
                .into_connection(),
        );
        let service = DealService::new(db.clone());
        let page = service
            .list_vendor_deals(&vendor_user(), &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].deal.vendor_id, 3);

        drop(service);
        let log = statement_log(db);
        assert!(log.contains(r#"\"deals\".\"vendor_id\" = $1"#));
        assert!(log.contains("BigInt(Some(3))"));
    }
}
