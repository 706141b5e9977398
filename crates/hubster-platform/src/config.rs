use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_APP_URL: &str = "http://localhost:8080";
const DEFAULT_MP_API_BASE: &str = "https://api.mercadopago.com";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub access_token: String,
    pub public_key: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
    pub currency: String,
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Absent means the gateway keeps proposals in memory.
    pub database_url: Option<String>,
    /// Absent means sent-proposal notifications are only logged.
    pub redis_url: Option<String>,
    pub http_addr: String,
    pub app_url: String,
    pub payment: PaymentConfig,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub redis_url: String,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(default_http_addr, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(default_http_addr: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let access_token = optional("MP_ACCESS_TOKEN").context("MP_ACCESS_TOKEN is required")?;
        let timeout_secs = match optional("GATEWAY_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GATEWAY_TIMEOUT_SECS '{raw}' is not a number"))?,
            None => DEFAULT_GATEWAY_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            redis_url: optional("REDIS_URL"),
            http_addr: optional("HTTP_ADDR").unwrap_or_else(|| default_http_addr.to_string()),
            app_url: optional("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            payment: PaymentConfig {
                access_token,
                public_key: optional("MP_PUBLIC_KEY"),
                api_base: optional("MP_API_BASE")
                    .unwrap_or_else(|| DEFAULT_MP_API_BASE.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                currency: optional("PAYMENT_CURRENCY")
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            },
        })
    }

    pub fn worker_from_env() -> Result<WorkerConfig> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let redis_url = std::env::var("REDIS_URL").context("REDIS_URL is required")?;

        Ok(WorkerConfig {
            database_url,
            redis_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config =
            ServiceConfig::from_lookup("0.0.0.0:8080", lookup(&[("MP_ACCESS_TOKEN", "TEST-1")]))
                .unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.payment.api_base, "https://api.mercadopago.com");
        assert_eq!(config.payment.timeout, Duration::from_secs(10));
        assert_eq!(config.payment.currency, "BRL");
    }

    #[test]
    fn access_token_is_required() {
        let err = ServiceConfig::from_lookup("0.0.0.0:8080", lookup(&[("MP_ACCESS_TOKEN", " ")]))
            .unwrap_err();
        assert!(err.to_string().contains("MP_ACCESS_TOKEN"));
    }

    #[test]
    fn explicit_values_win() {
        let config = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[
                ("MP_ACCESS_TOKEN", "TEST-1"),
                ("MP_PUBLIC_KEY", "PUB-1"),
                ("DATABASE_URL", "postgres://localhost/hubster"),
                ("HTTP_ADDR", "127.0.0.1:9000"),
                ("APP_URL", "https://hubster.app"),
                ("GATEWAY_TIMEOUT_SECS", "3"),
            ]),
        )
        .unwrap();

        assert_eq!(config.http_addr, "127.0.0.1:9000");
        assert_eq!(config.app_url, "https://hubster.app");
        assert_eq!(config.payment.public_key.as_deref(), Some("PUB-1"));
        assert_eq!(config.payment.timeout, Duration::from_secs(3));
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/hubster")
        );
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let result = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[("MP_ACCESS_TOKEN", "TEST-1"), ("GATEWAY_TIMEOUT_SECS", "soon")]),
        );
        assert!(result.is_err());
    }
}
