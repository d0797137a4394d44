//! The module contains `Wallet` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletKind {
    Personal,
    Business,
}

impl WalletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Business => "business",
        }
    }
}

impl TryFrom<&str> for WalletKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "personal" => Ok(Self::Personal),
            "business" => Ok(Self::Business),
            other => Err(EngineError::InvalidInput(format!(
                "invalid wallet type: {other}"
            ))),
        }
    }
}

/// A wallet.
///
/// A wallet is a named balance holder: a bank account, a cash drawer, a
/// company card. Its balance is never assigned directly; it only moves through
/// the conditional increase/decrease updates issued while recording a
/// transaction, so it can never drop below zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    pub id: Uuid,
    pub name: String,
    pub kind: WalletKind,
    /// ISO 4217 code, upper-case.
    pub currency: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            name: model.name,
            kind: WalletKind::try_from(model.kind.as_str())?,
            currency: model.currency,
            balance: Money::new(model.balance_minor),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub kind: String,
    pub currency: String,
    pub balance_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::has_wallets::Entity")]
    HasWallets,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::has_wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HasWallets.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            currency: ActiveValue::Set(value.currency.clone()),
            balance_minor: ActiveValue::Set(value.balance.minor()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_text() {
        for kind in [WalletKind::Personal, WalletKind::Business] {
            assert_eq!(WalletKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(matches!(
            WalletKind::try_from("savings"),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn model_with_corrupt_id_is_rejected() {
        let model = Model {
            id: "not-a-uuid".to_string(),
            name: "Cash".to_string(),
            kind: "personal".to_string(),
            currency: "EUR".to_string(),
            balance_minor: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            Wallet::try_from(model),
            Err(EngineError::InvalidId("invalid wallet id".to_string()))
        );
    }
}
