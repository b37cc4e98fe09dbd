use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Which check guards the admin routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Compare a shared static secret. Insecure: no identity, no expiry.
    Static,
    /// Require a valid session cookie for a user with the admin role.
    SignedToken,
}

impl FromStr for AuthPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(AuthPolicy::Static),
            "signed-token" | "signed_token" | "jwt" => Ok(AuthPolicy::SignedToken),
            other => anyhow::bail!("unknown auth policy `{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub auth_policy: AuthPolicy,
    pub admin_token: Option<String>,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "devtinder".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "devtinder-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES", 15)?,
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");

        let auth_policy = match std::env::var("AUTH_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => AuthPolicy::SignedToken,
        };
        let admin_token = std::env::var("ADMIN_TOKEN").ok().filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("APP_PORT", 7777)?,
            jwt,
            auth_policy,
            admin_token,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}
