//! Deal verification PINs.
//!
//! A deal stores either a plaintext PIN (`pin_salt` is `None`) or a bcrypt
//! hash of `pin || salt`. On top of the stored PIN every deal also exposes a
//! rotating 6-digit PIN that changes every `interval_minutes` and is derived
//! from the stored PIN material, so re-issuing the PIN changes the series.

use crate::error::{AppError, AppResult};
use crate::utils::code_generator::{generate_salt, generate_six_digit_code};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub const PIN_SALT_LEN: usize = 16;

pub fn generate_pin() -> String {
    generate_six_digit_code()
}

/// Vendor-chosen PINs must be 4 to 6 digits.
pub fn validate_vendor_pin(pin: &str) -> AppResult<()> {
    if !(4..=6).contains(&pin.len()) || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "PIN must be 4 to 6 digits".to_string(),
        ));
    }
    Ok(())
}

/// Returns `(hash, salt)`.
pub fn hash_pin(pin: &str) -> AppResult<(String, String)> {
    let salt = generate_salt(PIN_SALT_LEN);
    let hashed = hash(format!("{pin}{salt}"), DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("PIN hashing failed: {e}")))?;
    Ok((hashed, salt))
}

pub fn verify_static_pin(input: &str, stored: &str, salt: Option<&str>) -> bool {
    let input = input.trim();
    match salt {
        None => !stored.is_empty() && input == stored,
        Some(salt) => match verify(format!("{input}{salt}"), stored) {
            Ok(ok) => ok,
            Err(e) => {
                log::warn!("Stored PIN hash could not be verified: {e}");
                false
            }
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RotatingPinState {
    pub pin: String,
    pub window_started_at: DateTime<Utc>,
    pub next_rotation_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RotatingPin {
    interval_minutes: i64,
    secret: String,
}

impl RotatingPin {
    pub fn new(interval_minutes: i64, secret: impl Into<String>) -> Self {
        Self {
            interval_minutes: interval_minutes.max(1),
            secret: secret.into(),
        }
    }

    pub fn interval_minutes(&self) -> i64 {
        self.interval_minutes
    }

    fn interval_secs(&self) -> i64 {
        self.interval_minutes * 60
    }

    pub fn window_index(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(self.interval_secs())
    }

    pub fn pin_for_window(&self, deal_id: i64, pin_material: &str, window: i64) -> String {
        let digest = md5::compute(format!(
            "{deal_id}:{pin_material}:{window}:{}",
            self.secret
        ));
        let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        format!("{:06}", head % 1_000_000)
    }

    pub fn current(&self, deal_id: i64, pin_material: &str, now: DateTime<Utc>) -> RotatingPinState {
        let window = self.window_index(now);
        let started = DateTime::<Utc>::from_timestamp(window * self.interval_secs(), 0).unwrap_or(now);
        RotatingPinState {
            pin: self.pin_for_window(deal_id, pin_material, window),
            window_started_at: started,
            next_rotation_at: started + Duration::seconds(self.interval_secs()),
        }
    }

    /// Accepts the PIN of the current window or of the `grace_windows` windows before it.
    pub fn matches(
        &self,
        deal_id: i64,
        pin_material: &str,
        input: &str,
        now: DateTime<Utc>,
        grace_windows: i64,
    ) -> bool {
        let input = input.trim();
        let window = self.window_index(now);
        (0..=grace_windows.max(0))
            .any(|back| self.pin_for_window(deal_id, pin_material, window - back) == input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_generate_pin_is_six_digits() {
        let pin = generate_pin();
        assert_eq!(pin.len(), 6);
        assert!(pin.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_validate_vendor_pin() {
        assert!(validate_vendor_pin("1234").is_ok());
        assert!(validate_vendor_pin("123456").is_ok());
        assert!(validate_vendor_pin("123").is_err());
        assert!(validate_vendor_pin("1234567").is_err());
        assert!(validate_vendor_pin("12a4").is_err());
    }

    #[test]
    fn test_plain_pin_verification() {
        assert!(verify_static_pin("482913", "482913", None));
        assert!(verify_static_pin(" 482913 ", "482913", None));
        assert!(!verify_static_pin("482914", "482913", None));
        assert!(!verify_static_pin("", "", None));
    }

    #[test]
    fn test_hashed_pin_verification() {
        let (hashed, salt) = hash_pin("7291").unwrap();
        assert_eq!(salt.len(), PIN_SALT_LEN);
        assert_ne!(hashed, "7291");
        assert!(verify_static_pin("7291", &hashed, Some(&salt)));
        assert!(!verify_static_pin("7292", &hashed, Some(&salt)));
        assert!(!verify_static_pin("7291", &hashed, Some("wrong-salt")));
    }

    #[test]
    fn test_rotating_pin_is_stable_within_window() {
        let rp = RotatingPin::new(30, "secret");
        let a = rp.current(11, "123456", at(1_800 * 1000 + 5));
        let b = rp.current(11, "123456", at(1_800 * 1000 + 1_799));
        assert_eq!(a.pin, b.pin);
        assert_eq!(a.pin.len(), 6);
        assert_eq!(a.window_started_at, at(1_800 * 1000));
        assert_eq!(a.next_rotation_at, at(1_800 * 1001));
    }

    #[test]
    fn test_rotating_pin_depends_on_inputs() {
        let rp = RotatingPin::new(30, "secret");
        let base = rp.pin_for_window(11, "123456", 1000);
        // a collision on any one of these is possible but vanishingly unlikely
        let changed = [
            rp.pin_for_window(12, "123456", 1000),
            rp.pin_for_window(11, "654321", 1000),
            RotatingPin::new(30, "other").pin_for_window(11, "123456", 1000),
        ];
        assert!(changed.iter().any(|p| *p != base));
        assert_eq!(base, rp.pin_for_window(11, "123456", 1000));
    }

    #[test]
    fn test_rotating_pin_grace_window() {
        let rp = RotatingPin::new(30, "secret");
        let previous = rp.pin_for_window(5, "m", 999);
        let now = at(1_800 * 1000 + 10);

        let current = rp.current(5, "m", now).pin;
        let stale = rp.pin_for_window(5, "m", 998);

        assert!(rp.matches(5, "m", &current, now, 0));
        assert!(rp.matches(5, "m", &previous, now, 1));
        if previous != current {
            assert!(!rp.matches(5, "m", &previous, now, 0));
        }
        if stale != current && stale != previous {
            assert!(!rp.matches(5, "m", &stale, now, 1));
            assert!(rp.matches(5, "m", &stale, now, 2));
        }
    }

    #[test]
    fn test_window_index_follows_interval() {
        let rp = RotatingPin::new(15, "s");
        assert_eq!(rp.window_index(at(0)), 0);
        assert_eq!(rp.window_index(at(899)), 0);
        assert_eq!(rp.window_index(at(900)), 1);
        assert_eq!(RotatingPin::new(0, "s").interval_minutes(), 1);
    }
}
