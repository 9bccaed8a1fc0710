use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, tokens::TokenSigner};

mod expenses;
mod users;

pub use expenses::enrich_shares;

/// Token lifetime when the builder is not told otherwise.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tokens: TokenSigner,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    token_secret: String,
    token_ttl: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Key used to sign and verify bearer tokens. Required.
    pub fn token_secret(mut self, secret: &str) -> EngineBuilder {
        self.token_secret = secret.to_string();
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.token_ttl = Some(ttl);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let ttl = self
            .token_ttl
            .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
        Ok(Engine {
            database: self.database,
            tokens: TokenSigner::new(&self.token_secret, ttl)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_values_are_trimmed() {
        assert_eq!(normalize_required("  Bob ", "name").unwrap(), "Bob");
        assert_eq!(
            normalize_required("   ", "name"),
            Err(EngineError::InvalidInput("name must not be empty".to_string()))
        );
    }

    #[test]
    fn blank_optional_text_is_none() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(
            normalize_optional_text(Some(" https://x/y.png ")),
            Some("https://x/y.png".to_string())
        );
    }

    #[tokio::test]
    async fn builder_requires_a_secret() {
        let err = Engine::builder().build().await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
