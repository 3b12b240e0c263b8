use crate::entities::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Authenticated caller, stored in request extensions by [`AuthMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn require_role(&self, allowed: &[UserRole]) -> AppResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // prefixes that are public for GET only; a token is still read when present
    read_only_prefixes: Vec<&'static str>,
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
            read_only_prefixes: vec!["/api/v1/deals", "/api/v1/vendors"],
            excluded_paths: vec!["/api/v1/auth/logout", "/api/v1/auth/me"],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        *method == Method::GET
            && self
                .read_only_prefixes
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.jwt_service.verify_access_token(token)?;
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        Ok(AuthUser {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let is_public = self.public_paths.is_public_path(req.method(), req.path());
        let auth = bearer_token(&req).map(|token| self.authenticate(token));

        match auth {
            Some(Ok(user)) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            // anonymous access to public routes; a bad token is ignored there
            _ if is_public => Box::pin(self.service.call(req)),
            Some(Err(e)) => {
                log::debug!("Rejected access token on {}: {e}", req.path());
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::AuthError("Missing access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// The authenticated caller, or 401 when the request carried no valid token.
pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
}

pub fn current_admin(req: &HttpRequest) -> AppResult<AuthUser> {
    let user = current_user(req)?;
    user.require_admin()?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::GET, "/swagger-ui/"));
        assert!(paths.is_public_path(&Method::GET, "/api-docs/openapi.json"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/login"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/refresh"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/auth/logout"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/auth/me"));
    }

    #[test]
    fn test_read_only_prefixes_need_get() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::GET, "/api/v1/deals"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/deals/15"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/vendors"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/deals"));
        assert!(!paths.is_public_path(&Method::DELETE, "/api/v1/deals/15"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/pos/sessions"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/admin/analytics"));
    }

    #[test]
    fn test_current_user_from_extensions() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(current_user(&req), Err(AppError::AuthError(_))));

        let user = AuthUser {
            id: 9,
            email: "v@shop.in".into(),
            role: UserRole::Vendor,
        };
        req.extensions_mut().insert(user.clone());
        assert_eq!(current_user(&req).unwrap(), user);
        assert!(matches!(current_admin(&req), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_role_guards() {
        let vendor = AuthUser {
            id: 1,
            email: "v@shop.in".into(),
            role: UserRole::Vendor,
        };
        assert!(vendor.require_role(&[UserRole::Vendor]).is_ok());
        assert!(matches!(
            vendor.require_role(&[UserRole::Customer]),
            Err(AppError::Forbidden)
        ));
        assert!(vendor.require_admin().is_err());

        let root = AuthUser {
            role: UserRole::SuperAdmin,
            ..vendor
        };
        assert!(root.require_admin().is_ok());
    }
}
