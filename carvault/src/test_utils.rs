//! Test helpers: a fast, in-memory configuration and a seeded [`AppState`].

use crate::{
    auth::password::{self, Argon2Params},
    config::Config,
    db::models::users::UserCreateDBRequest,
    AppState,
};

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-sessions".to_string()),
        ..Default::default()
    };
    // Cheap argon2 parameters keep registration tests fast
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;
    config
}

pub fn create_test_state(config: Config) -> AppState {
    AppState::in_memory(config).expect("Failed to create test state")
}

/// Insert a user directly and return a session token for them.
pub async fn create_test_user(state: &AppState, email: &str) -> String {
    let password_hash = password::hash_password("password123", Argon2Params::from(&state.config.auth.password)).unwrap();
    let user = state
        .users
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            name: "Test User".to_string(),
            password_hash,
        })
        .await
        .expect("Failed to create test user");

    state.tokens.issue(user.id).unwrap()
}
