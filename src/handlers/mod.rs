pub mod admin;
pub mod auth;
pub mod claim;
pub mod deal;
pub mod help_ticket;
pub mod pos;
pub mod user;
pub mod vendor;
pub mod wishlist;

pub use admin::admin_config;
pub use auth::auth_config;
pub use claim::claim_config;
pub use deal::deal_config;
pub use help_ticket::help_ticket_config;
pub use pos::pos_config;
pub use user::user_config;
pub use vendor::vendor_config;
pub use wishlist::wishlist_config;
