//! OAuth helpers.

pub mod pkce;

pub use pkce::{generate_code_challenge, generate_code_verifier, generate_state, PkceChallenge};
