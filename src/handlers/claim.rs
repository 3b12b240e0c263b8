use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{ClaimService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/claims/deals/{deal_id}",
    tag = "claims",
    params(("deal_id" = i64, Path, description = "Deal id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Claim code issued", body = ClaimResponse),
        (status = 400, description = "Deal not claimable or claim already open"),
        (status = 403, description = "Membership tier too low")
    )
)]
pub async fn claim_deal(
    claim_service: web::Data<ClaimService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match claim_service.claim_with_code(&user, path.into_inner()).await {
        Ok(claim) => Ok(HttpResponse::Created().json(ApiResponse::success(claim))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/claims/deals/{deal_id}/redeem-pin",
    tag = "claims",
    params(("deal_id" = i64, Path, description = "Deal id")),
    request_body = RedeemWithPinRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deal redeemed", body = DealClaimResponse),
        (status = 400, description = "Wrong PIN or deal not claimable")
    )
)]
pub async fn redeem_with_pin(
    claim_service: web::Data<ClaimService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RedeemWithPinRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match claim_service
        .redeem_with_pin(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(claim) => Ok(HttpResponse::Ok().json(ApiResponse::success(claim))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/claims",
    tag = "claims",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own claim history, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_claims(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match user_service.list_claims(user.id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn claim_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/claims")
            .route("", web::get().to(list_claims))
            .route("/deals/{deal_id}", web::post().to(claim_deal))
            .route("/deals/{deal_id}/redeem-pin", web::post().to(redeem_with_pin)),
    );
}
