pub mod admin_service;
pub mod auth_service;
pub mod claim_service;
pub mod deal_service;
pub mod help_ticket_service;
pub mod pos_service;
pub mod user_service;
pub mod vendor_service;
pub mod wishlist_service;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use claim_service::ClaimService;
pub use deal_service::DealService;
pub use help_ticket_service::HelpTicketService;
pub use pos_service::PosService;
pub use user_service::UserService;
pub use vendor_service::VendorService;
pub use wishlist_service::WishlistService;
