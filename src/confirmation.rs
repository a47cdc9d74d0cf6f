//! Emailed confirmation codes
//!
//! A code is `<ts_hex>-<mac_hex>`: the issue timestamp plus a keyed hash of
//! that timestamp and the user's current state (id, email, role). Changing
//! the user's email or role invalidates outstanding codes, and codes lapse
//! after the configured lifetime. Nothing is stored server-side.

use crate::config::Config;
use crate::orm::users;
use chrono::Utc;
use sea_orm::ActiveEnum;

const KEY_CONTEXT: &str = "scorebook 2024-01-05 confirmation code";

fn signing_key(config: &Config) -> [u8; 32] {
    blake3::derive_key(KEY_CONTEXT, config.secret_key.as_bytes())
}

fn state_mac(key: &[u8; 32], user: &users::Model, issued_at: i64) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(&issued_at.to_le_bytes());
    hasher.update(&user.id.to_le_bytes());
    hasher.update(user.email.as_bytes());
    hasher.update(user.role.to_value().as_bytes());
    hasher.finalize()
}

/// Generate a confirmation code bound to the user's current state.
pub fn generate(config: &Config, user: &users::Model) -> String {
    let issued_at = Utc::now().timestamp();
    let mac = state_mac(&signing_key(config), user, issued_at);
    format!("{:x}-{}", issued_at, mac.to_hex())
}

/// Check a submitted confirmation code against the user's current state.
pub fn check(config: &Config, user: &users::Model, code: &str) -> bool {
    let Some((ts_hex, mac_hex)) = code.split_once('-') else {
        return false;
    };
    let Ok(issued_at) = i64::from_str_radix(ts_hex, 16) else {
        return false;
    };
    let Ok(given) = blake3::Hash::from_hex(mac_hex) else {
        return false;
    };

    let now = Utc::now().timestamp();
    if issued_at > now || now - issued_at > config.confirmation_code_hours * 3600 {
        return false;
    }

    // blake3::Hash equality is constant-time.
    state_mac(&signing_key(config), user, issued_at) == given
}
