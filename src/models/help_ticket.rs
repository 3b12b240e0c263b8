use crate::entities::{TicketPriority, TicketStatus, help_ticket_entity as help_tickets};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PaginationParams;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    #[schema(example = "Claim code not accepted")]
    pub subject: String,
    pub description: String,
    /// Defaults to `general`.
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub admin_response: Option<String>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl TicketListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub admin_response: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<help_tickets::Model> for TicketResponse {
    fn from(t: help_tickets::Model) -> Self {
        let created_at = t.created_at.unwrap_or_else(Utc::now);
        Self {
            id: t.id,
            user_id: t.user_id,
            subject: t.subject,
            description: t.description,
            category: t.category,
            priority: t.priority,
            status: t.status,
            admin_response: t.admin_response,
            resolved_at: t.resolved_at,
            created_at,
            updated_at: t.updated_at.unwrap_or(created_at),
        }
    }
}
