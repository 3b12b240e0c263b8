use crate::entities::{deal_entity as deals, wishlist_entity as wishlists};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct WishlistService {
    pool: DbPool,
}

impl WishlistService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, user_id: i64, deal_id: i64) -> AppResult<WishlistItem> {
        let deal = deals::Entity::find_by_id(deal_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Deal not found".to_string()))?;

        let exists = wishlists::Entity::find()
            .filter(wishlists::Column::UserId.eq(user_id))
            .filter(wishlists::Column::DealId.eq(deal_id))
            .count(self.pool.as_ref())
            .await?;
        if exists > 0 {
            return Err(AppError::ValidationError(
                "Deal is already in your wishlist".to_string(),
            ));
        }

        let now = Utc::now();
        let row = wishlists::ActiveModel {
            user_id: Set(user_id),
            deal_id: Set(deal_id),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        Ok(WishlistItem {
            id: row.id,
            deal_id,
            added_at: row.created_at.unwrap_or(now),
            deal: Some(deal.into()),
        })
    }

    pub async fn remove(&self, user_id: i64, deal_id: i64) -> AppResult<()> {
        let result = wishlists::Entity::delete_many()
            .filter(wishlists::Column::UserId.eq(user_id))
            .filter(wishlists::Column::DealId.eq(deal_id))
            .exec(self.pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(
                "Deal is not in your wishlist".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<WishlistItem>> {
        let rows = wishlists::Entity::find()
            .filter(wishlists::Column::UserId.eq(user_id))
            .find_also_related(deals::Entity)
            .order_by_desc(wishlists::Column::CreatedAt)
            .all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row, deal)| WishlistItem {
                id: row.id,
                deal_id: row.deal_id,
                added_at: row.created_at.unwrap_or_else(Utc::now),
                deal: deal.map(DealSummary::from),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_add_missing_deal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<deals::Model>::new()])
            .into_connection();
        let err = WishlistService::new(db.into()).add(1, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_entry() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let err = WishlistService::new(db.into()).remove(1, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
