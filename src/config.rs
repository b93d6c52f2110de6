use std::time::Duration;

use anyhow::Context;

/// Upper bound for `JWT_EXPIRES_IN`, ten years.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Credentials for the admin account created at startup, if any.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub hash_cost: u32,
    pub jwt: JwtConfig,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port = std::env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;
        let hash_cost = std::env::var("HASH_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(2);
        let ttl = token_ttl(&std::env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "1d".into()))
            .context("JWT_EXPIRES_IN")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "useraccounts".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "useraccounts-users".into()),
            ttl,
        };
        let seed_admin = match (
            std::env::var("SEED_ADMIN_EMAIL"),
            std::env::var("SEED_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SeedAdmin {
                name: std::env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "admin".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url,
            hash_cost,
            jwt,
            seed_admin,
        })
    }
}

fn token_ttl(raw: &str) -> anyhow::Result<Duration> {
    let ttl = parse_duration(raw)?;
    if ttl > MAX_TOKEN_TTL {
        anyhow::bail!("token lifetime {raw:?} exceeds ten years");
    }
    Ok(ttl)
}

/// Parses lifetimes such as `3600`, `90s`, `15m`, `12h` or `7d`.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration {raw:?}"))?;
    let scale: u64 = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => anyhow::bail!("unknown duration unit {other:?}"),
    };
    let secs = amount
        .checked_mul(scale)
        .with_context(|| format!("duration {raw:?} is too large"))?;
    Ok(Duration::from_secs(secs))
}
