use crate::middlewares::current_user;
use crate::models::*;
use crate::services::PosService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/pos/sessions",
    tag = "pos",
    request_body = StartSessionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Session started; any previous session is ended", body = PosSessionResponse),
        (status = 403, description = "Caller is not a vendor")
    )
)]
pub async fn start_session(
    pos_service: web::Data<PosService>,
    req: HttpRequest,
    request: Option<web::Json<StartSessionRequest>>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let request = request.map(web::Json::into_inner).unwrap_or_default();
    match pos_service.start_session(&user, request).await {
        Ok(session) => Ok(HttpResponse::Created().json(ApiResponse::success(session))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/pos/sessions/{session_id}/end",
    tag = "pos",
    params(("session_id" = i64, Path, description = "POS session id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session ended", body = PosSessionResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn end_session(
    pos_service: web::Data<PosService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match pos_service.end_session(&user, path.into_inner()).await {
        Ok(session) => Ok(HttpResponse::Ok().json(ApiResponse::success(session))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/pos/sessions",
    tag = "pos",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The vendor's POS sessions")
    )
)]
pub async fn list_sessions(
    pos_service: web::Data<PosService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match pos_service.list_sessions(&user, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/pos/verify-code",
    tag = "pos",
    request_body = VerifyCodeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Claim verified", body = VerifyCodeResponse),
        (status = 400, description = "Claim code expired"),
        (status = 404, description = "No pending claim with this code")
    )
)]
pub async fn verify_code(
    pos_service: web::Data<PosService>,
    req: HttpRequest,
    request: web::Json<VerifyCodeRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match pos_service.verify_claim_code(&user, request.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/pos/complete-transaction",
    tag = "pos",
    request_body = CompleteTransactionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transaction recorded", body = CompleteTransactionResponse),
        (status = 400, description = "Claim not verified or bill invalid")
    )
)]
pub async fn complete_transaction(
    pos_service: web::Data<PosService>,
    req: HttpRequest,
    request: web::Json<CompleteTransactionRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match pos_service.complete_transaction(&user, request.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn pos_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/pos")
            .route("/sessions", web::post().to(start_session))
            .route("/sessions", web::get().to(list_sessions))
            .route("/sessions/{session_id}/end", web::post().to(end_session))
            .route("/verify-code", web::post().to(verify_code))
            .route("/complete-transaction", web::post().to(complete_transaction)),
    );
}
