use crate::entities::{DealType, MembershipPlan, deal_entity as deals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{PaginationParams, VendorSummary};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDealRequest {
    #[schema(example = "Flat 20% off on sweets")]
    pub title: String,
    pub description: String,
    #[schema(example = "food")]
    pub category: String,
    pub image_url: Option<String>,
    pub deal_type: Option<DealType>,
    #[schema(example = 20)]
    pub discount_percentage: i32,
    pub discount_code: Option<String>,
    /// In paise.
    pub original_price: Option<i64>,
    /// In paise.
    pub discounted_price: Option<i64>,
    /// Defaults to now.
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub max_redemptions: Option<i32>,
    pub required_membership: Option<MembershipPlan>,
    /// 4 to 6 digits; generated when omitted.
    #[schema(example = "4821")]
    pub verification_pin: Option<String>,
    /// Store the PIN as a salted hash.
    #[serde(default)]
    pub secure_pin: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub deal_type: Option<DealType>,
    pub discount_percentage: Option<i32>,
    pub discount_code: Option<String>,
    pub original_price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_redemptions: Option<i32>,
    pub required_membership: Option<MembershipPlan>,
    pub is_active: Option<bool>,
}

impl UpdateDealRequest {
    /// Whether the edit touches what moderators reviewed.
    pub fn changes_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.image_url.is_some()
            || self.deal_type.is_some()
            || self.discount_percentage.is_some()
            || self.discount_code.is_some()
            || self.original_price.is_some()
            || self.discounted_price.is_some()
            || self.valid_from.is_some()
            || self.valid_until.is_some()
            || self.max_redemptions.is_some()
            || self.required_membership.is_some()
    }
}

/// Deal as shown to anyone; never carries PIN material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealResponse {
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
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<deals::Model> for DealResponse {
    fn from(d: deals::Model) -> Self {
        Self {
            id: d.id,
            vendor_id: d.vendor_id,
            title: d.title,
            description: d.description,
            category: d.category,
            image_url: d.image_url,
            deal_type: d.deal_type,
            discount_percentage: d.discount_percentage,
            discount_code: d.discount_code,
            original_price: d.original_price,
            discounted_price: d.discounted_price,
            valid_from: d.valid_from,
            valid_until: d.valid_until,
            max_redemptions: d.max_redemptions,
            current_redemptions: d.current_redemptions,
            required_membership: d.required_membership,
            is_active: d.is_active,
            is_approved: d.is_approved,
            is_rejected: d.is_rejected,
            rejection_reason: d.rejection_reason,
            view_count: d.view_count,
            created_at: d.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// The owning vendor's view, including the PIN when it is stored in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VendorDealResponse {
    pub deal: DealResponse,
    pub verification_pin: Option<String>,
    pub pin_is_hashed: bool,
}

impl From<deals::Model> for VendorDealResponse {
    fn from(d: deals::Model) -> Self {
        let verification_pin = d.visible_pin().map(str::to_string);
        let pin_is_hashed = d.pin_is_hashed();
        Self {
            deal: d.into(),
            verification_pin,
            pin_is_hashed,
        }
    }
}

/// Returned once at creation; carries the plaintext PIN even when it is stored hashed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDealResponse {
    pub deal: DealResponse,
    pub verification_pin: String,
    pub pin_is_hashed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image_url: Option<String>,
    pub discount_percentage: i32,
    pub original_price: Option<i64>,
    pub discounted_price: Option<i64>,
    pub valid_until: DateTime<Utc>,
}

impl From<deals::Model> for DealSummary {
    fn from(d: deals::Model) -> Self {
        Self {
            id: d.id,
            title: d.title,
            category: d.category,
            image_url: d.image_url,
            discount_percentage: d.discount_percentage,
            original_price: d.original_price,
            discounted_price: d.discounted_price,
            valid_until: d.valid_until,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealDetailResponse {
    pub deal: DealResponse,
    pub vendor: Option<VendorSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicDealItem {
    pub deal: DealResponse,
    pub vendor: VendorSummary,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DealListQuery {
    pub category: Option<String>,
    /// Vendor city.
    pub city: Option<String>,
    /// Matched against title and description.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl DealListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteDealResponse {
    pub deal_id: i64,
    /// `true` when the deal had claims and was only deactivated.
    pub soft_deleted: bool,
}
