use crate::middlewares::current_user;
use crate::models::*;
use crate::services::HelpTicketService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/help-tickets",
    tag = "help-tickets",
    request_body = CreateTicketRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Ticket opened", body = TicketResponse),
        (status = 400, description = "Invalid ticket")
    )
)]
pub async fn create_ticket(
    ticket_service: web::Data<HelpTicketService>,
    req: HttpRequest,
    request: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match ticket_service.create(user.id, request.into_inner()).await {
        Ok(ticket) => Ok(HttpResponse::Created().json(ApiResponse::success(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/help-tickets",
    tag = "help-tickets",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own tickets, newest first")
    )
)]
pub async fn list_own_tickets(
    ticket_service: web::Data<HelpTicketService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match ticket_service.list_own(user.id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn help_ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/help-tickets")
            .route("", web::post().to(create_ticket))
            .route("", web::get().to(list_own_tickets)),
    );
}
