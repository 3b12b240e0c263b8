pub mod code_generator;
pub mod email;
pub mod jwt;
pub mod password;
pub mod phone;
pub mod pin;
pub mod savings;

pub use code_generator::{generate_claim_code, normalize_code};
pub use email::*;
pub use jwt::*;
pub use password::*;
pub use phone::*;
pub use pin::{RotatingPin, RotatingPinState};
pub use savings::{compute_savings, verification_rate};
