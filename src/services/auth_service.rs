use crate::entities::{MembershipPlan, UserRole, user_entity as users};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.pool.as_ref())
            .await?)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.email, user.role)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, &user.email, user.role)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let name = request.name.trim().to_string();
        if name.chars().count() < 2 || name.chars().count() > 100 {
            return Err(AppError::ValidationError(
                "Name must be between 2 and 100 characters".to_string(),
            ));
        }

        // privileged roles are only created by the bootstrap account
        let role = request.role.unwrap_or(UserRole::Customer);
        if role.is_admin() {
            return Err(AppError::ValidationError(
                "Role must be customer or vendor".to_string(),
            ));
        }

        let phone = match request.phone.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => {
                let formatted = format_in_phone(p);
                validate_in_phone(&formatted)?;
                Some(formatted)
            }
            _ => None,
        };

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::ValidationError(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();
        let user = users::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(name),
            phone: Set(phone),
            role: Set(role),
            city: Set(request.city),
            state: Set(request.state),
            membership_plan: Set(MembershipPlan::Basic),
            total_savings: Set(0),
            deals_claimed: Set(0),
            is_active: Set(true),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("User {} registered with role {}", user.id, user.role);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(user)
    }

    pub async fn me(&self, user_id: i64) -> AppResult<UserResponse> {
        users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Creates the configured superadmin if no account uses that email yet.
    pub async fn ensure_admin_account(&self, email: &str, password: &str) -> AppResult<()> {
        let email = normalize_email(email);
        validate_email(&email)?;

        if let Some(existing) = self.find_by_email(&email).await? {
            if !existing.role.is_admin() {
                log::warn!(
                    "Bootstrap admin email {email} belongs to a {} account, leaving it unchanged",
                    existing.role
                );
            }
            return Ok(());
        }

        let now = Utc::now();
        let admin = users::ActiveModel {
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            name: Set("Administrator".to_string()),
            role: Set(UserRole::SuperAdmin),
            membership_plan: Set(MembershipPlan::Ultimate),
            total_savings: Set(0),
            deals_claimed: Set(0),
            is_active: Set(true),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Bootstrap admin account {} created", admin.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: sea_orm::DatabaseConnection) -> AuthService {
        AuthService::new(db.into(), JwtService::new("test", 3600, 7200))
    }

    fn register_request(role: Option<UserRole>) -> RegisterRequest {
        RegisterRequest {
            email: "Shopper@Example.com".into(),
            password: "deals2024".into(),
            name: "Asha".into(),
            phone: None,
            role,
            city: None,
            state: None,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_admin_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = service(db)
            .register(register_request(Some(UserRole::Admin)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_phone() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut req = register_request(None);
        req.phone = Some("12345".into());
        let err = service(db).register(req).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let err = service(db)
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "whatever1".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let jwt = JwtService::new("test", 3600, 7200);
        let access = jwt
            .generate_access_token(1, "a@b.in", UserRole::Customer)
            .unwrap();
        let err = service(db).refresh_token(&access).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }
}
