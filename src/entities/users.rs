use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "vendor")]
    Vendor,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "superadmin")]
    SuperAdmin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Customer => write!(f, "customer"),
            UserRole::Vendor => write!(f, "vendor"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::SuperAdmin => write!(f, "superadmin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "vendor" => Ok(UserRole::Vendor),
            "admin" => Ok(UserRole::Admin),
            "superadmin" => Ok(UserRole::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Membership tiers, ordered from lowest to highest.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum MembershipPlan {
    #[sea_orm(string_value = "basic")]
    Basic,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "ultimate")]
    Ultimate,
}

impl std::fmt::Display for MembershipPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipPlan::Basic => write!(f, "basic"),
            MembershipPlan::Premium => write!(f, "premium"),
            MembershipPlan::Ultimate => write!(f, "ultimate"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    pub password_hash: String,
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
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Plan in force at `now`; a lapsed paid plan falls back to basic.
    pub fn effective_plan(&self, now: DateTime<Utc>) -> MembershipPlan {
        match self.membership_expires_at {
            Some(expires) if expires <= now => MembershipPlan::Basic,
            _ => self.membership_plan,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(plan: MembershipPlan, expires_at: Option<DateTime<Utc>>) -> Model {
        Model {
            id: 1,
            email: "c@example.com".into(),
            password_hash: String::new(),
            name: "C".into(),
            phone: None,
            role: UserRole::Customer,
            city: None,
            state: None,
            membership_plan: plan,
            membership_expires_at: expires_at,
            total_savings: 0,
            deals_claimed: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_membership_ordering() {
        assert!(MembershipPlan::Basic < MembershipPlan::Premium);
        assert!(MembershipPlan::Premium < MembershipPlan::Ultimate);
    }

    #[test]
    fn test_expired_membership_falls_back_to_basic() {
        let now = Utc::now();
        let active = user(MembershipPlan::Ultimate, Some(now + Duration::days(3)));
        let lapsed = user(MembershipPlan::Ultimate, Some(now - Duration::days(1)));
        let open_ended = user(MembershipPlan::Premium, None);
        assert_eq!(active.effective_plan(now), MembershipPlan::Ultimate);
        assert_eq!(lapsed.effective_plan(now), MembershipPlan::Basic);
        assert_eq!(open_ended.effective_plan(now), MembershipPlan::Premium);
    }

    #[test]
    fn test_role_parse_and_admin_check() {
        assert_eq!("superadmin".parse::<UserRole>(), Ok(UserRole::SuperAdmin));
        assert!(UserRole::SuperAdmin.is_admin());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Vendor.is_admin());
        assert!("owner".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Customer.to_string(), "customer");
    }
}
