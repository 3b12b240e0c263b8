use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{DealService, VendorService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/vendors/register",
    tag = "vendors",
    request_body = RegisterVendorRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Vendor profile created, pending approval", body = VendorResponse),
        (status = 400, description = "Invalid input or profile already exists"),
        (status = 403, description = "Caller is not a vendor account")
    )
)]
pub async fn register(
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    request: web::Json<RegisterVendorRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match vendor_service.register(&user, request.into_inner()).await {
        Ok(vendor) => Ok(HttpResponse::Created().json(ApiResponse::success(vendor))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendors/me",
    tag = "vendors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own vendor profile", body = VendorResponse),
        (status = 404, description = "No vendor profile")
    )
)]
pub async fn me(vendor_service: web::Data<VendorService>, req: HttpRequest) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match vendor_service.me(&user).await {
        Ok(vendor) => Ok(HttpResponse::Ok().json(ApiResponse::success(vendor))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/vendors/me",
    tag = "vendors",
    request_body = UpdateVendorRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vendor profile updated", body = VendorResponse),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn update_profile(
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    request: web::Json<UpdateVendorRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match vendor_service.update_profile(&user, request.into_inner()).await {
        Ok(vendor) => Ok(HttpResponse::Ok().json(ApiResponse::success(vendor))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendors",
    tag = "vendors",
    params(VendorListQuery),
    responses(
        (status = 200, description = "Approved vendors")
    )
)]
pub async fn list_vendors(
    vendor_service: web::Data<VendorService>,
    query: web::Query<VendorListQuery>,
) -> Result<HttpResponse> {
    match vendor_service.list_public(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendors/deals",
    tag = "vendors",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deals owned by the calling vendor"),
        (status = 403, description = "Caller is not a vendor")
    )
)]
pub async fn list_own_deals(
    deal_service: web::Data<DealService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match deal_service.list_vendor_deals(&user, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendors/dashboard/claimed-deals",
    tag = "vendors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Claim summary and rows for the vendor's deals", body = ClaimedDealsDashboard),
        (status = 403, description = "Caller is not a vendor")
    )
)]
pub async fn claimed_deals_dashboard(
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match vendor_service.claimed_deals_dashboard(&user).await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(ApiResponse::success(dashboard))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/vendors/deals/{deal_id}/pin",
    tag = "vendors",
    params(("deal_id" = i64, Path, description = "Deal id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current rotating PIN", body = CurrentPinResponse),
        (status = 403, description = "Deal belongs to another vendor"),
        (status = 404, description = "Deal not found")
    )
)]
pub async fn current_pin(
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match vendor_service.current_pin(&user, path.into_inner()).await {
        Ok(pin) => Ok(HttpResponse::Ok().json(ApiResponse::success(pin))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/vendors/deals/{deal_id}/pin/regenerate",
    tag = "vendors",
    params(("deal_id" = i64, Path, description = "Deal id")),
    request_body = RegeneratePinRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New PIN, shown once", body = RegeneratePinResponse),
        (status = 403, description = "Deal belongs to another vendor")
    )
)]
pub async fn regenerate_pin(
    vendor_service: web::Data<VendorService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: Option<web::Json<RegeneratePinRequest>>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let request = request.map(web::Json::into_inner).unwrap_or_default();
    match vendor_service.regenerate_pin(&user, path.into_inner(), request).await {
        Ok(pin) => Ok(HttpResponse::Ok().json(ApiResponse::success(pin))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn vendor_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vendors")
            .route("", web::get().to(list_vendors))
            .route("/register", web::post().to(register))
            .route("/me", web::get().to(me))
            .route("/me", web::put().to(update_profile))
            .route("/deals", web::get().to(list_own_deals))
            .route("/dashboard/claimed-deals", web::get().to(claimed_deals_dashboard))
            .route("/deals/{deal_id}/pin", web::get().to(current_pin))
            .route("/deals/{deal_id}/pin/regenerate", web::post().to(regenerate_pin)),
    );
}
