use crate::entities::{ClaimStatus, deal_claim_entity as deal_claims, deal_entity as deals, user_entity as users};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{format_in_phone, validate_in_phone};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        self.find_user(user_id).await.map(UserResponse::from)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        if request.name.is_none()
            && request.phone.is_none()
            && request.city.is_none()
            && request.state.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        if let Some(name) = &request.name {
            let len = name.trim().chars().count();
            if !(2..=100).contains(&len) {
                return Err(AppError::ValidationError(
                    "Name must be between 2 and 100 characters".to_string(),
                ));
            }
        }

        let phone = match request.phone.as_deref().map(str::trim) {
            Some("") => Some(None),
            Some(p) => {
                let formatted = format_in_phone(p);
                validate_in_phone(&formatted)?;
                Some(Some(formatted))
            }
            None => None,
        };

        let mut model = self.find_user(user_id).await?.into_active_model();
        if let Some(name) = request.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(phone) = phone {
            model.phone = Set(phone);
        }
        if let Some(city) = request.city {
            model.city = Set(Some(city));
        }
        if let Some(state) = request.state {
            model.state = Set(Some(state));
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(self.pool.as_ref()).await?;
        Ok(UserResponse::from(updated))
    }

    pub async fn get_stats(&self, user_id: i64) -> AppResult<UserStats> {
        let user = self.find_user(user_id).await?;

        let redeemed_count = deal_claims::Entity::find()
            .filter(deal_claims::Column::UserId.eq(user_id))
            .filter(deal_claims::Column::Status.eq(ClaimStatus::Used))
            .count(self.pool.as_ref())
            .await?;

        let average_savings = if redeemed_count > 0 {
            user.total_savings / redeemed_count as i64
        } else {
            0
        };

        Ok(UserStats {
            total_savings: user.total_savings,
            deals_claimed: user.deals_claimed,
            redeemed_count,
            average_savings,
        })
    }

    pub async fn list_claims(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ClaimHistoryItem>> {
        let base = deal_claims::Entity::find().filter(deal_claims::Column::UserId.eq(user_id));

        let total = base.clone().count(self.pool.as_ref()).await?;
        let rows = base
            .find_also_related(deals::Entity)
            .order_by_desc(deal_claims::Column::ClaimedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?;

        let items = rows
            .into_iter()
            .map(|(claim, deal)| ClaimHistoryItem {
                claim: claim.into(),
                deal: deal.map(DealSummary::from),
            })
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_update_profile_requires_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = UserService::new(db.into())
            .update_profile(
                1,
                UpdateUserRequest {
                    name: None,
                    phone: None,
                    city: None,
                    state: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_profile_of_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let err = UserService::new(db.into()).get_profile(404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
