use crate::middlewares::current_admin;
use crate::models::*;
use crate::services::{AdminService, HelpTicketService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/admin/vendors/pending",
    tag = "admin",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vendors awaiting approval, oldest first"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn pending_vendors(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.pending_vendors(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/vendors/{vendor_id}/approve",
    tag = "admin",
    params(("vendor_id" = i64, Path, description = "Vendor id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vendor approved", body = VendorResponse),
        (status = 404, description = "Vendor not found")
    )
)]
pub async fn approve_vendor(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin = current_admin(&req)?;
    match admin_service.approve_vendor(&admin, path.into_inner()).await {
        Ok(vendor) => Ok(HttpResponse::Ok().json(ApiResponse::success(vendor))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/vendors/{vendor_id}/reject",
    tag = "admin",
    params(("vendor_id" = i64, Path, description = "Vendor id")),
    request_body = RejectRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vendor rejected", body = VendorResponse),
        (status = 400, description = "Reason missing")
    )
)]
pub async fn reject_vendor(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectRequest>,
) -> Result<HttpResponse> {
    let admin = current_admin(&req)?;
    match admin_service
        .reject_vendor(&admin, path.into_inner(), request.into_inner())
        .await
    {
        Ok(vendor) => Ok(HttpResponse::Ok().json(ApiResponse::success(vendor))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/deals/pending",
    tag = "admin",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deals awaiting moderation, oldest first")
    )
)]
pub async fn pending_deals(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.pending_deals(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/deals/{deal_id}/approve",
    tag = "admin",
    params(("deal_id" = i64, Path, description = "Deal id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deal approved", body = DealResponse),
        (status = 404, description = "Deal not found")
    )
)]
pub async fn approve_deal(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin = current_admin(&req)?;
    match admin_service.approve_deal(&admin, path.into_inner()).await {
        Ok(deal) => Ok(HttpResponse::Ok().json(ApiResponse::success(deal))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/deals/{deal_id}/reject",
    tag = "admin",
    params(("deal_id" = i64, Path, description = "Deal id")),
    request_body = RejectRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deal rejected", body = DealResponse),
        (status = 400, description = "Reason missing")
    )
)]
pub async fn reject_deal(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectRequest>,
) -> Result<HttpResponse> {
    let admin = current_admin(&req)?;
    match admin_service
        .reject_deal(&admin, path.into_inner(), request.into_inner())
        .await
    {
        Ok(deal) => Ok(HttpResponse::Ok().json(ApiResponse::success(deal))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(UserListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users, newest first")
    )
)]
pub async fn list_users(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.list_users(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/analytics",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Platform counters", body = AnalyticsSummary)
    )
)]
pub async fn analytics_summary(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.analytics_summary().await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/analytics/claim-codes",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Claim code usage by vendor and category", body = ClaimCodeAnalytics)
    )
)]
pub async fn claim_code_analytics(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.claim_code_analytics().await {
        Ok(analytics) => Ok(HttpResponse::Ok().json(ApiResponse::success(analytics))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/audit/deal-codes",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Shared open claim codes and hashed-PIN deals", body = DealCodeAudit)
    )
)]
pub async fn deal_code_audit(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match admin_service.deal_code_audit().await {
        Ok(audit) => Ok(HttpResponse::Ok().json(ApiResponse::success(audit))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/help-tickets",
    tag = "admin",
    params(TicketListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All tickets, optionally filtered by status")
    )
)]
pub async fn list_tickets(
    ticket_service: web::Data<HelpTicketService>,
    req: HttpRequest,
    query: web::Query<TicketListQuery>,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match ticket_service.admin_list(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/help-tickets/{ticket_id}",
    tag = "admin",
    params(("ticket_id" = i64, Path, description = "Ticket id")),
    request_body = UpdateTicketRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket updated", body = TicketResponse),
        (status = 404, description = "Ticket not found")
    )
)]
pub async fn update_ticket(
    ticket_service: web::Data<HelpTicketService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateTicketRequest>,
) -> Result<HttpResponse> {
    current_admin(&req)?;
    match ticket_service
        .admin_update(path.into_inner(), request.into_inner())
        .await
    {
        Ok(ticket) => Ok(HttpResponse::Ok().json(ApiResponse::success(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/vendors/pending", web::get().to(pending_vendors))
            .route("/vendors/{vendor_id}/approve", web::post().to(approve_vendor))
            .route("/vendors/{vendor_id}/reject", web::post().to(reject_vendor))
            .route("/deals/pending", web::get().to(pending_deals))
            .route("/deals/{deal_id}/approve", web::post().to(approve_deal))
            .route("/deals/{deal_id}/reject", web::post().to(reject_deal))
            .route("/users", web::get().to(list_users))
            .route("/analytics", web::get().to(analytics_summary))
            .route("/analytics/claim-codes", web::get().to(claim_code_analytics))
            .route("/audit/deal-codes", web::get().to(deal_code_audit))
            .route("/help-tickets", web::get().to(list_tickets))
            .route("/help-tickets/{ticket_id}", web::put().to(update_ticket)),
    );
}
