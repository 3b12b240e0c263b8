use super::users::MembershipPlan;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    #[sea_orm(string_value = "offline")]
    Offline,
    #[sea_orm(string_value = "online")]
    Online,
}

/// Deal row.
///
/// - `verification_pin` holds the plaintext PIN when `pin_salt` is `None`,
///   otherwise a bcrypt hash of `pin || pin_salt`.
/// - Money columns are in paise.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub vendor_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub deal_type: DealType,
    pub discount_percentage: i32,
    pub discount_code: Option<String>,
    pub original_price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub max_redemptions: Option<i32>,
    pub current_redemptions: i32,
    pub required_membership: MembershipPlan,
    pub is_active: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<i64>,
    pub verification_pin: String,
    pub pin_salt: Option<String>,
    pub view_count: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn pin_is_hashed(&self) -> bool {
        self.pin_salt.is_some()
    }

    /// Plaintext PIN, if the deal stores one.
    pub fn visible_pin(&self) -> Option<&str> {
        if self.pin_is_hashed() {
            None
        } else {
            Some(self.verification_pin.as_str())
        }
    }

    pub fn is_sold_out(&self) -> bool {
        matches!(self.max_redemptions, Some(max) if self.current_redemptions >= max)
    }

    /// Live for customers: approved, active and inside the validity window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.is_approved
            && !self.is_rejected
            && self.valid_from <= now
            && now < self.valid_until
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id",
        on_delete = "Cascade"
    )]
    Vendor,
    #[sea_orm(has_many = "super::deal_claims::Entity")]
    DealClaims,
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::deal_claims::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DealClaims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
