pub mod admin;
pub mod claim;
pub mod common;
pub mod deal;
pub mod help_ticket;
pub mod pagination;
pub mod pos;
pub mod user;
pub mod vendor;
pub mod wishlist;

pub use admin::*;
pub use claim::*;
pub use common::*;
pub use deal::*;
pub use help_ticket::*;
pub use pagination::*;
pub use pos::*;
pub use user::*;
pub use vendor::*;
pub use wishlist::*;
