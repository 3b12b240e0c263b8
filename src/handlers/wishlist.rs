use crate::middlewares::current_user;
use crate::models::*;
use crate::services::WishlistService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/wishlist",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wishlist with deal summaries", body = Vec<WishlistItem>)
    )
)]
pub async fn list_wishlist(
    wishlist_service: web::Data<WishlistService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match wishlist_service.list(user.id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/wishlist",
    tag = "wishlist",
    request_body = AddWishlistRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Added", body = WishlistItem),
        (status = 400, description = "Already in wishlist"),
        (status = 404, description = "Deal not found")
    )
)]
pub async fn add_to_wishlist(
    wishlist_service: web::Data<WishlistService>,
    req: HttpRequest,
    request: web::Json<AddWishlistRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match wishlist_service.add(user.id, request.deal_id).await {
        Ok(item) => Ok(HttpResponse::Created().json(ApiResponse::success(item))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/wishlist/{deal_id}",
    tag = "wishlist",
    params(("deal_id" = i64, Path, description = "Deal id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Not in wishlist")
    )
)]
pub async fn remove_from_wishlist(
    wishlist_service: web::Data<WishlistService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match wishlist_service.remove(user.id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Removed from wishlist"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn wishlist_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wishlist")
            .route("", web::get().to(list_wishlist))
            .route("", web::post().to(add_to_wishlist))
            .route("/{deal_id}", web::delete().to(remove_from_wishlist)),
    );
}
