use actix_web::http::header;
use actix_web::HttpResponse;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::config::LABEL_LEN;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// First `LABEL_LEN` characters of `text`, used wherever an entity is shown by name.
pub fn short_label(text: &str) -> &str {
    match text.char_indices().nth(LABEL_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Only same-site absolute paths are accepted as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_label_truncates_to_fifteen_chars() {
        assert_eq!(short_label("The quick brown fox jumps"), "The quick brown");
    }

    #[test]
    fn short_label_keeps_short_text_as_is() {
        assert_eq!(short_label("short"), "short");
        assert_eq!(short_label(""), "");
        assert_eq!(short_label("exactly fifteen"), "exactly fifteen");
    }

    #[test]
    fn short_label_counts_characters_not_bytes() {
        let text = "Война и мир переоценен";
        assert_eq!(short_label(text), "Война и мир пер");
        assert_eq!(short_label(text).chars().count(), 15);
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn safe_next_rejects_foreign_targets() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
