use crate::entities::{TicketPriority, TicketStatus, help_ticket_entity as help_tickets};
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct HelpTicketService {
    pool: DbPool,
}

fn validate_ticket(request: &CreateTicketRequest) -> AppResult<()> {
    let subject_len = request.subject.trim().chars().count();
    if !(3..=200).contains(&subject_len) {
        return Err(AppError::ValidationError(
            "Subject must be between 3 and 200 characters".to_string(),
        ));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Description is required".to_string(),
        ));
    }
    Ok(())
}

impl HelpTicketService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, request: CreateTicketRequest) -> AppResult<TicketResponse> {
        validate_ticket(&request)?;

        let now = Utc::now();
        let ticket = help_tickets::ActiveModel {
            user_id: Set(user_id),
            subject: Set(request.subject.trim().to_string()),
            description: Set(request.description.trim().to_string()),
            category: Set(request
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "general".to_string())),
            priority: Set(request.priority.unwrap_or(TicketPriority::Medium)),
            status: Set(TicketStatus::Open),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!("Help ticket {} opened by user {}", ticket.id, user_id);
        Ok(TicketResponse::from(ticket))
    }

    pub async fn list_own(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TicketResponse>> {
        let select = help_tickets::Entity::find().filter(help_tickets::Column::UserId.eq(user_id));
        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(help_tickets::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(TicketResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn admin_list(
        &self,
        query: &TicketListQuery,
    ) -> AppResult<PaginatedResponse<TicketResponse>> {
        let params = query.pagination();
        let mut select = help_tickets::Entity::find();
        if let Some(status) = query.status {
            select = select.filter(help_tickets::Column::Status.eq(status));
        }

        let total = select.clone().count(self.pool.as_ref()).await?;
        let items = select
            .order_by_desc(help_tickets::Column::CreatedAt)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(self.pool.as_ref())
            .await?
            .into_iter()
            .map(TicketResponse::from)
            .collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    pub async fn admin_update(
        &self,
        ticket_id: i64,
        request: UpdateTicketRequest,
    ) -> AppResult<TicketResponse> {
        if request.status.is_none() && request.admin_response.is_none() && request.priority.is_none()
        {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let ticket = help_tickets::Entity::find_by_id(ticket_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        let now = Utc::now();
        let previously_terminal = ticket.status.is_terminal();
        let mut model = ticket.into_active_model();
        if let Some(status) = request.status {
            model.status = Set(status);
            if status.is_terminal() && !previously_terminal {
                model.resolved_at = Set(Some(now));
            } else if !status.is_terminal() {
                model.resolved_at = Set(None);
            }
        }
        if let Some(response) = request.admin_response {
            model.admin_response = Set(Some(response));
        }
        if let Some(priority) = request.priority {
            model.priority = Set(priority);
        }
        model.updated_at = Set(Some(now));

        let updated = model.update(self.pool.as_ref()).await?;
        Ok(TicketResponse::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subject: &str, description: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            subject: subject.into(),
            description: description.into(),
            category: None,
            priority: None,
        }
    }

    #[test]
    fn test_ticket_validation() {
        assert!(validate_ticket(&request("Code rejected", "The shop said my code is invalid")).is_ok());
        assert!(validate_ticket(&request("Hi", "too short subject")).is_err());
        assert!(validate_ticket(&request(&"x".repeat(201), "long")).is_err());
        assert!(validate_ticket(&request("Refund", "   ")).is_err());
    }
}
