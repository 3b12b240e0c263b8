use crate::entities::{MembershipPlan, UserRole, user_entity as users};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "shopper@example.com")]
    pub email: String,
    #[schema(example = "deals2024")]
    pub password: String,
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
    /// `customer` (default) or `vendor`.
    pub role: Option<UserRole>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "shopper@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub city: Option<String>,
    pub state: Option<String>,
    pub membership_plan: MembershipPlan,
    pub membership_expires_at: Option<DateTime<Utc>>,
    pub total_savings: i64,
    pub deals_claimed: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(u: users::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            city: u.city,
            state: u.state,
            membership_plan: u.membership_plan,
            membership_expires_at: u.membership_expires_at,
            total_savings: u.total_savings,
            deals_claimed: u.deals_claimed,
            is_active: u.is_active,
            created_at: u.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Customer details shown to a vendor at the counter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_plan: MembershipPlan,
}

impl From<users::Model> for CustomerSummary {
    fn from(u: users::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            membership_plan: u.membership_plan,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStats {
    pub total_savings: i64,
    pub deals_claimed: i32,
    pub redeemed_count: u64,
    pub average_savings: i64,
}
