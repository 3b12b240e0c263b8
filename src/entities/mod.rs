pub mod deal_claims;
pub mod deals;
pub mod help_tickets;
pub mod pos_sessions;
pub mod users;
pub mod vendors;
pub mod wishlists;

pub use deal_claims::{ClaimStatus, CodeKind};
pub use deals::DealType;
pub use help_tickets::{TicketPriority, TicketStatus};
pub use users::{MembershipPlan, UserRole};
pub use vendors::VendorStatus;

pub use deal_claims as deal_claim_entity;
pub use deals as deal_entity;
pub use help_tickets as help_ticket_entity;
pub use pos_sessions as pos_session_entity;
pub use users as user_entity;
pub use vendors as vendor_entity;
pub use wishlists as wishlist_entity;
