use anyhow::Context;
use tracing::info;

use crate::auth::password::hash_password;
use crate::state::AppState;
use crate::users::{
    repo_types::{NewUser, Role},
    services::normalize_email,
};

/// Creates the configured admin account unless an active user already owns
/// that email. Does nothing when no seed admin is configured.
pub async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let Some(seed) = &state.config.seed_admin else {
        return Ok(());
    };
    let email = normalize_email(&seed.email);

    if state.users.find_active_by_email(&email).await?.is_some() {
        info!(%email, "seed admin already present");
        return Ok(());
    }

    let password_hash = hash_password(seed.password.clone(), state.config.hash_cost).await?;
    let user = state
        .users
        .create(NewUser {
            name: seed.name.trim().to_string(),
            email,
            password_hash,
            phone: None,
            role: Role::Admin,
        })
        .await
        .context("create seed admin")?;

    info!(user_id = user.id, "seed admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, SeedAdmin};
    use crate::test_support::{login, TestApp};

    fn config_with_seed() -> AppConfig {
        AppConfig {
            seed_admin: Some(SeedAdmin {
                name: "root".into(),
                email: "Root@Example.com".into(),
                password: "root-pw".into(),
            }),
            ..AppConfig::fake()
        }
    }

    #[tokio::test]
    async fn creates_admin_once() {
        let app = TestApp::with_config(config_with_seed());
        ensure_admin(&app.state).await.unwrap();
        ensure_admin(&app.state).await.unwrap();

        let admin = app
            .state
            .users
            .find_active_by_email("root@example.com")
            .await
            .unwrap()
            .expect("admin exists");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(app.state.users.count(&Default::default()).await.unwrap(), 1);

        login(&app, "root@example.com", "root-pw").await;
    }

    #[tokio::test]
    async fn no_seed_configured_is_a_no_op() {
        let state = AppState::fake();
        ensure_admin(&state).await.unwrap();
        assert_eq!(state.users.count(&Default::default()).await.unwrap(), 0);
    }
}
