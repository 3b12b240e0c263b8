use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    ClaimStatus, CodeKind, DealType, MembershipPlan, TicketPriority, TicketStatus, UserRole,
    VendorStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::get_stats,
        handlers::vendor::register,
        handlers::vendor::me,
        handlers::vendor::update_profile,
        handlers::vendor::list_vendors,
        handlers::vendor::list_own_deals,
        handlers::vendor::claimed_deals_dashboard,
        handlers::vendor::current_pin,
        handlers::vendor::regenerate_pin,
        handlers::deal::list_deals,
        handlers::deal::get_deal,
        handlers::deal::create_deal,
        handlers::deal::update_deal,
        handlers::deal::delete_deal,
        handlers::claim::claim_deal,
        handlers::claim::redeem_with_pin,
        handlers::claim::list_claims,
        handlers::pos::start_session,
        handlers::pos::end_session,
        handlers::pos::list_sessions,
        handlers::pos::verify_code,
        handlers::pos::complete_transaction,
        handlers::wishlist::list_wishlist,
        handlers::wishlist::add_to_wishlist,
        handlers::wishlist::remove_from_wishlist,
        handlers::help_ticket::create_ticket,
        handlers::help_ticket::list_own_tickets,
        handlers::admin::pending_vendors,
        handlers::admin::approve_vendor,
        handlers::admin::reject_vendor,
        handlers::admin::pending_deals,
        handlers::admin::approve_deal,
        handlers::admin::reject_deal,
        handlers::admin::list_users,
        handlers::admin::analytics_summary,
        handlers::admin::claim_code_analytics,
        handlers::admin::deal_code_audit,
        handlers::admin::list_tickets,
        handlers::admin::update_ticket,
    ),
    components(
        schemas(
            UserRole,
            MembershipPlan,
            VendorStatus,
            DealType,
            ClaimStatus,
            CodeKind,
            TicketPriority,
            TicketStatus,
            ApiError,
            ErrorResponse,
            PaginationParams,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UpdateUserRequest,
            UserResponse,
            CustomerSummary,
            AuthResponse,
            UserStats,
            RegisterVendorRequest,
            UpdateVendorRequest,
            VendorResponse,
            VendorSummary,
            ClaimSummary,
            VendorClaimRow,
            DealPerformance,
            ClaimedDealsDashboard,
            CurrentPinResponse,
            RegeneratePinRequest,
            RegeneratePinResponse,
            CreateDealRequest,
            UpdateDealRequest,
            DealResponse,
            VendorDealResponse,
            CreateDealResponse,
            DealSummary,
            DealDetailResponse,
            PublicDealItem,
            DeleteDealResponse,
            ClaimResponse,
            RedeemWithPinRequest,
            DealClaimResponse,
            ClaimHistoryItem,
            VerifyCodeRequest,
            VerifyCodeResponse,
            CompleteTransactionRequest,
            CompleteTransactionResponse,
            StartSessionRequest,
            PosSessionResponse,
            AddWishlistRequest,
            WishlistItem,
            CreateTicketRequest,
            UpdateTicketRequest,
            TicketResponse,
            RejectRequest,
            DealCounts,
            AnalyticsSummary,
            ClaimCodeSummary,
            VendorClaimPerformance,
            CategoryClaimBreakdown,
            ClaimCodeAnalytics,
            SharedClaimCode,
            HashedPinDeal,
            DealCodeAudit,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and tokens"),
        (name = "users", description = "Customer profile and savings"),
        (name = "vendors", description = "Vendor profiles, dashboards and PINs"),
        (name = "deals", description = "Deal browsing and vendor deal management"),
        (name = "claims", description = "Claim codes and PIN redemption"),
        (name = "pos", description = "Point-of-sale verification"),
        (name = "wishlist", description = "Saved deals"),
        (name = "help-tickets", description = "Support tickets"),
        (name = "admin", description = "Moderation and analytics"),
    ),
    info(
        title = "Instoredealz Backend API",
        version = "1.0.0",
        description = "Instoredealz deal marketplace REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_has_bearer_scheme_and_routes() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/pos/verify-code"));
        assert!(doc.paths.paths.contains_key("/vendors/deals/{deal_id}/pin"));
    }
}
