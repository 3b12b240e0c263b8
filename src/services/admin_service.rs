use crate::entities::{
    ClaimStatus, VendorStatus, deal_claim_entity as deal_claims, deal_entity as deals,
    user_entity as users, vendor_entity as vendors,
};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::*;
use crate::utils::verification_rate;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Groups open claims by code and keeps the codes that appear on more than one deal.
pub(crate) fn find_shared_codes(claims: &[(String, i64, i64)]) -> Vec<SharedClaimCode> {
    let mut by_code: BTreeMap<&str, (BTreeSet<i64>, Vec<i64>)> = BTreeMap::new();
    for (code, deal_id, claim_id) in claims {
        let entry = by_code.entry(code.as_str()).or_default();
        entry.0.insert(*deal_id);
        entry.1.push(*claim_id);
    }

    by_code
        .into_iter()
        .filter(|(_, (deal_ids, _))| deal_ids.len() > 1)
        .map(|(code, (deal_ids, mut claim_ids))| {
            claim_ids.sort_unstable();
            SharedClaimCode {
                claim_code: code.to_string(),
                deal_ids: deal_ids.into_iter().collect(),
                claim_ids,
            }
        })
        .collect()
}

fn validate_reason(reason: &str) -> AppResult<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError(
            "A rejection reason is required".to_string(),
        ));
    }
    Ok(reason.to_string())
}

pub(crate) fn as_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

#[derive(Debug, FromQueryResult)]
struct VendorClaimAggregate {
    vendor_id: i64,
    total: i64,
    verified: i64,
    used: i64,
    revenue: i64,
}

#[derive(Debug, FromQueryResult)]
struct CategoryAggregate {
    category: String,
    total: i64,
    used: i64,
    savings: i64,
}

#[derive(Clone)]
pub struct AdminService {
    pool: DbPool,
}

impl AdminService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn pending_vendors(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<VendorResponse>> {
        let select = vendors::Entity::find().filter(vendors::Column::Status.eq(VendorStatus::Pending));
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_asc(vendors::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(VendorResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    async fn find_vendor(&self, vendor_id: i64) -> AppResult<vendors::Model> {
        vendors::Entity::find_by_id(vendor_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))
    }

    pub async fn approve_vendor(&self, admin: &AuthUser, vendor_id: i64) -> AppResult<VendorResponse> {
        let mut model = self.find_vendor(vendor_id).await?.into_active_model();
        model.status = Set(VendorStatus::Approved);
        model.is_approved = Set(true);
        model.rejection_reason = Set(None);
        model.updated_at = Set(Some(Utc::now()));
        let vendor = model.update(self.pool.as_ref()).await?;

        log::info!("Vendor {} approved by admin {}", vendor.id, admin.id);
        Ok(VendorResponse::from(vendor))
    }

    pub async fn reject_vendor(
        &self,
        admin: &AuthUser,
        vendor_id: i64,
        request: RejectRequest,
    ) -> AppResult<VendorResponse> {
        let reason = validate_reason(&request.reason)?;
        let mut model = self.find_vendor(vendor_id).await?.into_active_model();
        model.status = Set(VendorStatus::Rejected);
        model.is_approved = Set(false);
        model.rejection_reason = Set(Some(reason));
        model.updated_at = Set(Some(Utc::now()));
        let vendor = model.update(self.pool.as_ref()).await?;

        log::info!("Vendor {} rejected by admin {}", vendor.id, admin.id);
        Ok(VendorResponse::from(vendor))
    }

    pub async fn pending_deals(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<DealResponse>> {
        let select = deals::Entity::find()
            .filter(deals::Column::IsApproved.eq(false))
            .filter(deals::Column::IsRejected.eq(false));
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_asc(deals::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(DealResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    async fn find_deal(&self, deal_id: i64) -> AppResult<deals::Model> {
        deals::Entity::find_by_id(deal_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))
    }

    pub async fn approve_deal(&self, admin: &AuthUser, deal_id: i64) -> AppResult<DealResponse> {
        let mut model = self.find_deal(deal_id).await?.into_active_model();
        model.is_approved = Set(true);
        model.is_rejected = Set(false);
        model.rejection_reason = Set(None);
        model.approved_by = Set(Some(admin.id));
        model.updated_at = Set(Some(Utc::now()));
        let deal = model.update(self.pool.as_ref()).await?;

        log::info!("Deal {} approved by admin {}", deal.id, admin.id);
        Ok(DealResponse::from(deal))
    }

    pub async fn reject_deal(
        &self,
        admin: &AuthUser,
        deal_id: i64,
        request: RejectRequest,
    ) -> AppResult<DealResponse> {
        let reason = validate_reason(&request.reason)?;
        let mut model = self.find_deal(deal_id).await?.into_active_model();
        model.is_approved = Set(false);
        model.is_rejected = Set(true);
        model.rejection_reason = Set(Some(reason));
        model.approved_by = Set(None);
        model.updated_at = Set(Some(Utc::now()));
        let deal = model.update(self.pool.as_ref()).await?;

        log::info!("Deal {} rejected by admin {}", deal.id, admin.id);
        Ok(DealResponse::from(deal))
    }

    pub async fn list_users(&self, query: &UserListQuery) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = query.pagination();
        let mut select = users::Entity::find();
        if let Some(role) = query.role {
            select = select.filter(users::Column::Role.eq(role));
        }
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(users::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn analytics_summary(&self) -> AppResult<AnalyticsSummary> {
        let users_by_role: BTreeMap<String, u64> = users::Entity::find()
            .select_only()
            .column(users::Column::Role)
            .column_as(Expr::col(users::Column::Id).count(), "count")
            .group_by(users::Column::Role)
            .into_tuple::<(String, i64)>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|(role, n)| (role, as_count(n)))
            .collect();

        let vendors_by_status: BTreeMap<String, u64> = vendors::Entity::find()
            .select_only()
            .column(vendors::Column::Status)
            .column_as(Expr::col(vendors::Column::Id).count(), "count")
            .group_by(vendors::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|(status, n)| (status, as_count(n)))
            .collect();

        let claims_by_status: BTreeMap<String, u64> = deal_claims::Entity::find()
            .select_only()
            .column(deal_claims::Column::Status)
            .column_as(Expr::col(deal_claims::Column::Id).count(), "count")
            .group_by(deal_claims::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|(status, n)| (status, as_count(n)))
            .collect();

        let now = Utc::now();
        let deals = DealCounts {
            total: deals::Entity::find().count(self.pool.as_ref()).await?,
            active: deals::Entity::find()
                .filter(deals::Column::IsActive.eq(true))
                .filter(deals::Column::IsApproved.eq(true))
                .filter(deals::Column::ValidUntil.gt(now))
                .count(self.pool.as_ref())
                .await?,
            pending_approval: deals::Entity::find()
                .filter(deals::Column::IsApproved.eq(false))
                .filter(deals::Column::IsRejected.eq(false))
                .count(self.pool.as_ref())
                .await?,
            rejected: deals::Entity::find()
                .filter(deals::Column::IsRejected.eq(true))
                .count(self.pool.as_ref())
                .await?,
        };

        let total_savings = users::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(total_savings), 0)::BIGINT"), "total")
            .into_tuple::<i64>()
            .one(self.pool.as_ref())
            .await?
            .unwrap_or(0);

        Ok(AnalyticsSummary {
            total_users: users_by_role.values().sum(),
            users_by_role,
            vendors_by_status,
            deals,
            claims_by_status,
            total_savings,
        })
    }

    pub async fn claim_code_analytics(&self) -> AppResult<ClaimCodeAnalytics> {
        let per_vendor = deal_claims::Entity::find()
            .select_only()
            .column(deal_claims::Column::VendorId)
            .column_as(Expr::cust("COUNT(*)"), "total")
            .column_as(Expr::cust("COUNT(*) FILTER (WHERE vendor_verified)"), "verified")
            .column_as(Expr::cust("COUNT(*) FILTER (WHERE status = 'used')"), "used")
            .column_as(Expr::cust("COALESCE(SUM(bill_amount), 0)::BIGINT"), "revenue")
            .group_by(deal_claims::Column::VendorId)
            .into_model::<VendorClaimAggregate>()
            .all(self.pool.as_ref())
            .await?;

        let vendor_ids: Vec<i64> = per_vendor.iter().map(|r| r.vendor_id).collect();
        let names: HashMap<i64, String> = if vendor_ids.is_empty() {
            HashMap::new()
        } else {
            vendors::Entity::find()
                .filter(vendors::Column::Id.is_in(vendor_ids))
                .all(self.pool.as_ref())
                .await?
                .into_iter()
                .map(|v| (v.id, v.business_name))
                .collect()
        };

        let mut vendors: Vec<VendorClaimPerformance> = per_vendor
            .iter()
            .map(|r| VendorClaimPerformance {
                vendor_id: r.vendor_id,
                business_name: names.get(&r.vendor_id).cloned().unwrap_or_default(),
                total_claims: as_count(r.total),
                verified_claims: as_count(r.verified),
                used_claims: as_count(r.used),
                total_revenue: r.revenue,
                verification_rate: verification_rate(as_count(r.verified), as_count(r.total)),
            })
            .collect();
        vendors.sort_by(|a, b| b.total_claims.cmp(&a.total_claims));

        let categories = deal_claims::Entity::find()
            .select_only()
            .inner_join(deals::Entity)
            .column_as(deals::Column::Category, "category")
            .column_as(Expr::cust("COUNT(*)"), "total")
            .column_as(
                Expr::cust("COUNT(*) FILTER (WHERE deal_claims.status = 'used')"),
                "used",
            )
            .column_as(
                Expr::cust("COALESCE(SUM(deal_claims.savings_amount), 0)::BIGINT"),
                "savings",
            )
            .group_by(deals::Column::Category)
            .into_model::<CategoryAggregate>()
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|r| CategoryClaimBreakdown {
                category: r.category,
                total_claims: as_count(r.total),
                used_claims: as_count(r.used),
                total_savings: r.savings,
            })
            .collect();

        let total_claims: u64 = vendors.iter().map(|v| v.total_claims).sum();
        let verified_claims: u64 = vendors.iter().map(|v| v.verified_claims).sum();
        let summary = ClaimCodeSummary {
            total_claims,
            verified_claims,
            used_claims: vendors.iter().map(|v| v.used_claims).sum(),
            expired_claims: deal_claims::Entity::find()
                .filter(deal_claims::Column::Status.eq(ClaimStatus::Expired))
                .count(self.pool.as_ref())
                .await?,
            total_savings: deal_claims::Entity::find()
                .select_only()
                .column_as(Expr::cust("COALESCE(SUM(savings_amount), 0)::BIGINT"), "total")
                .into_tuple::<i64>()
                .one(self.pool.as_ref())
                .await?
                .unwrap_or(0),
            verification_rate: verification_rate(verified_claims, total_claims),
        };

        Ok(ClaimCodeAnalytics {
            summary,
            vendors,
            categories,
        })
    }

    /// Codes shared by open claims on different deals, plus deals whose PIN is hashed.
    pub async fn deal_code_audit(&self) -> AppResult<DealCodeAudit> {
        let open_claims = deal_claims::Entity::find()
            .select_only()
            .column(deal_claims::Column::ClaimCode)
            .column(deal_claims::Column::DealId)
            .column(deal_claims::Column::Id)
            .filter(deal_claims::Column::Status.is_in(ClaimStatus::open()))
            .into_tuple::<(String, i64, i64)>()
            .all(self.pool.as_ref())
            .await?;

        let hashed_pin_deals = deals::Entity::find()
            .filter(deals::Column::PinSalt.is_not_null())
            .order_by_asc(deals::Column::Id)
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(|d| HashedPinDeal {
                deal_id: d.id,
                vendor_id: d.vendor_id,
                title: d.title,
            })
            .collect();

        Ok(DealCodeAudit {
            shared_codes: find_shared_codes(&open_claims),
            hashed_pin_deals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_find_shared_codes() {
        let claims = vec![
            ("K7M2QX".to_string(), 1, 10),
            ("K7M2QX".to_string(), 2, 11),
            ("AB23CD".to_string(), 3, 12),
            // same deal twice is not a cross-deal collision
            ("PP99QQ".to_string(), 4, 13),
            ("PP99QQ".to_string(), 4, 14),
        ];
        let shared = find_shared_codes(&claims);
        assert_eq!(
            shared,
            vec![SharedClaimCode {
                claim_code: "K7M2QX".into(),
                deal_ids: vec![1, 2],
                claim_ids: vec![10, 11],
            }]
        );
        assert!(find_shared_codes(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let admin = AuthUser {
            id: 1,
            email: "admin@instoredealz.com".into(),
            role: UserRole::Admin,
        };
        let err = AdminService::new(db.into())
            .reject_deal(&admin, 3, RejectRequest { reason: "  ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_approve_missing_vendor() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<vendors::Model>::new()])
            .into_connection();
        let admin = AuthUser {
            id: 1,
            email: "admin@instoredealz.com".into(),
            role: UserRole::SuperAdmin,
        };
        let err = AdminService::new(db.into())
            .approve_vendor(&admin, 77)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
