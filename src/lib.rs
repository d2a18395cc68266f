//! # Sesame (password reset, avatar and presence relay)
//!
//! `sesame` sits between end-user clients and a hosted Postgres-backed platform
//! (`PostgREST` tables and RPCs plus an auth admin API), a transactional email
//! provider, and an image host. It owns no data of its own.
//!
//! ## Password reset
//!
//! Resetting a password takes three independent requests:
//!
//! - **`POST /send-code`** generates a 6-digit one-time code, stores it on the
//!   platform, then mails it to the user.
//! - **`POST /verify-code`** asks the platform's verification procedure whether
//!   the `(email, code)` pair is valid.
//! - **`POST /reset-password`** verifies the pair again, resolves the account by
//!   email and overwrites its password.
//!
//! Nothing ties the three calls together in memory. Expiry, uniqueness and
//! consumption of codes are decided by the platform's verification procedure only.
//!
//! ## Avatars and presence
//!
//! `POST /avatar/update` swaps the profile image (deleting the previous remote
//! image on a best-effort basis) and the `/rooms` endpoints maintain online flags
//! for room membership.

pub mod api;
pub mod avatar;
pub mod cli;
pub mod email;
pub mod images;
pub mod platform;
pub mod reset;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
