use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, TokenIssuer};

mod access;
mod accounts;
mod budgets;
mod transactions;
mod wallets;

pub use transactions::TransactionStage;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// On error the `DatabaseTransaction` is dropped without commit, which rolls
/// back every statement issued through it.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tokens: TokenIssuer,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    tokens: Option<TokenIssuer>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the issuer that signs and verifies session tokens
    pub fn token_issuer(mut self, tokens: TokenIssuer) -> EngineBuilder {
        self.tokens = Some(tokens);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let tokens = self.tokens.ok_or_else(|| {
            EngineError::Configuration("token issuer is not configured".to_string())
        })?;
        Ok(Engine {
            database: self.database,
            tokens,
        })
    }
}
