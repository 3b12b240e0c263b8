use crate::middlewares::current_user;
use crate::models::*;
use crate::services::DealService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/deals",
    tag = "deals",
    params(DealListQuery),
    responses(
        (status = 200, description = "Live deals from approved vendors, newest first")
    )
)]
pub async fn list_deals(
    deal_service: web::Data<DealService>,
    query: web::Query<DealListQuery>,
) -> Result<HttpResponse> {
    match deal_service.list_public(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/deals/{deal_id}",
    tag = "deals",
    params(("deal_id" = i64, Path, description = "Deal id")),
    responses(
        (status = 200, description = "Deal detail", body = DealDetailResponse),
        (status = 404, description = "Deal not found")
    )
)]
pub async fn get_deal(
    deal_service: web::Data<DealService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match deal_service.get_public(path.into_inner()).await {
        Ok(deal) => Ok(HttpResponse::Ok().json(ApiResponse::success(deal))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/deals",
    tag = "deals",
    request_body = CreateDealRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Deal created, pending approval", body = CreateDealResponse),
        (status = 400, description = "Invalid deal"),
        (status = 403, description = "Vendor missing or not approved")
    )
)]
pub async fn create_deal(
    deal_service: web::Data<DealService>,
    req: HttpRequest,
    request: web::Json<CreateDealRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match deal_service.create(&user, request.into_inner()).await {
        Ok(deal) => Ok(HttpResponse::Created().json(ApiResponse::success(deal))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/deals/{deal_id}",
    tag = "deals",
    params(("deal_id" = i64, Path, description = "Deal id")),
    request_body = UpdateDealRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deal updated", body = VendorDealResponse),
        (status = 403, description = "Deal belongs to another vendor"),
        (status = 404, description = "Deal not found")
    )
)]
pub async fn update_deal(
    deal_service: web::Data<DealService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateDealRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match deal_service
        .update(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(deal) => Ok(HttpResponse::Ok().json(ApiResponse::success(deal))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/deals/{deal_id}",
    tag = "deals",
    params(("deal_id" = i64, Path, description = "Deal id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deal removed or deactivated", body = DeleteDealResponse),
        (status = 403, description = "Deal belongs to another vendor")
    )
)]
pub async fn delete_deal(
    deal_service: web::Data<DealService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match deal_service.delete(&user, path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn deal_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/deals")
            .route("", web::get().to(list_deals))
            .route("", web::post().to(create_deal))
            .route("/{deal_id}", web::get().to(get_deal))
            .route("/{deal_id}", web::put().to(update_deal))
            .route("/{deal_id}", web::delete().to(delete_deal)),
    );
}
