use anyhow::Context;
use serde::Deserialize;

const DEFAULT_TTL_MINUTES: i64 = 60 * 24 * 7;
/// Longest accepted token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL. `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Credits granted to every new account.
    pub signup_credits: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET")
                .filter(|v| !v.is_empty())
                .context("JWT_SECRET must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "sessionkit".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "sessionkit-users".into()),
            ttl_minutes: match lookup("JWT_TTL_MINUTES") {
                None => DEFAULT_TTL_MINUTES,
                Some(v) => v
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|m| (1..=MAX_TTL_MINUTES).contains(m))
                    .with_context(|| {
                        format!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {v:?}")
                    })?,
            },
        };
        let signup_credits = lookup("SIGNUP_CREDITS")
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(1)
            .max(1);
        Ok(Self {
            database_url,
            jwt,
            signup_credits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.issuer, "sessionkit");
        assert_eq!(cfg.jwt.audience, "sessionkit-users");
        assert_eq!(cfg.jwt.ttl_minutes, 60 * 24 * 7);
        assert_eq!(cfg.signup_credits, 1);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("JWT_ISSUER", "x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn signup_credits_never_drop_below_one() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("SIGNUP_CREDITS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.signup_credits, 1);

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("SIGNUP_CREDITS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.signup_credits, 5);
    }

    #[test]
    fn ttl_outside_one_year_is_rejected() {
        for ttl in ["1000000000000", "525601", "0", "-5", "soon"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                ("JWT_SECRET", "s"),
                ("JWT_TTL_MINUTES", ttl),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "ttl {ttl:?}");
        }

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("JWT_TTL_MINUTES", "525600"),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s"),
            ("JWT_ISSUER", "iss"),
            ("JWT_AUDIENCE", "aud"),
            ("JWT_TTL_MINUTES", "15"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ]))
        .unwrap();
        assert_eq!(cfg.jwt.issuer, "iss");
        assert_eq!(cfg.jwt.audience, "aud");
        assert_eq!(cfg.jwt.ttl_minutes, 15);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/app"));
    }
}
