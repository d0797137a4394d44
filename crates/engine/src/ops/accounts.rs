use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, SqlErr, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Session, User,
    credentials::verify_dummy,
    hash_password, sessions, users,
    util::{normalize_email, normalize_required, parse_uuid, validate_password},
    verify_password,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a user and opens its first session in one atomic unit.
    ///
    /// Fails with [`EngineError::DuplicateEmail`] if an active user already
    /// uses `email`. The check runs inside the inserting transaction and the
    /// partial unique index on `users.email` backs it up, so two racing
    /// registrations cannot both commit.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> ResultEngine<(User, Session)> {
        let full_name = normalize_required(full_name, "full name")?;
        let email = normalize_email(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::DuplicateEmail(email));
            }

            let model = users::new_active(full_name, email.clone(), password_hash, now)
                .insert(&db_tx)
                .await
                .map_err(|err| unique_email_violation(err, &email))?;
            let user = User::try_from(model)?;

            let session: Session = self.tokens.issue_at(user.id, &user.email, now)?.into();
            sessions::new_active(user.id, &session, now)
                .insert(&db_tx)
                .await?;

            info!(user_id = %user.id, "user registered");
            Ok((user, session))
        })
    }

    /// Opens a new session for an active user.
    ///
    /// An unknown email and a wrong password both yield
    /// [`EngineError::InvalidCredentials`]. Sessions accumulate; older ones
    /// stay valid until they expire or are revoked.
    pub async fn login(&self, email: &str, password: &str) -> ResultEngine<(User, Session)> {
        let email = email.trim().to_lowercase();
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let Some(model) = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
            else {
                debug!("login for unknown email");
                verify_dummy(password);
                return Err(EngineError::InvalidCredentials);
            };
            if !verify_password(password, &model.password_hash) {
                debug!(user_id = %model.id, "login with wrong password");
                return Err(EngineError::InvalidCredentials);
            }
            let user = User::try_from(model)?;

            let session: Session = self.tokens.issue_at(user.id, &user.email, now)?.into();
            sessions::new_active(user.id, &session, now)
                .insert(&db_tx)
                .await?;

            info!(user_id = %user.id, "user logged in");
            Ok((user, session))
        })
    }

    /// Maps a bearer token to its user.
    pub async fn resolve(&self, token: &str) -> ResultEngine<User> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Maps a bearer token to its user as if the current time were `now`.
    ///
    /// The token must carry a valid signature and be unexpired, a session row
    /// must exist for it and be unexpired too, and the owning user must not be
    /// soft-deleted. Any failure is [`EngineError::InvalidToken`].
    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> ResultEngine<User> {
        let claims = self.tokens.verify_at(token, now)?;

        let Some(session) = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .one(&self.database)
            .await?
        else {
            return Err(EngineError::InvalidToken("session not found".to_string()));
        };
        if session.expires_at <= now {
            return Err(EngineError::InvalidToken("session expired".to_string()));
        }
        if parse_uuid(&session.user_id, "user")? != claims.user_id {
            return Err(EngineError::InvalidToken("session owner mismatch".to_string()));
        }

        let model = users::Entity::find_by_id(session.user_id)
            .one(&self.database)
            .await?
            .filter(|model| !model.is_deleted())
            .ok_or_else(|| EngineError::InvalidToken("user not found".to_string()))?;

        User::try_from(model)
    }

    /// Deletes the session for `token`. Revoking an unknown token is not an error.
    pub async fn revoke(&self, token: &str) -> ResultEngine<()> {
        let res = sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.database)
            .await?;
        debug!(revoked = res.rows_affected, "session revoked");
        Ok(())
    }

    /// Soft-deletes a user. Its sessions stop resolving immediately and its
    /// email becomes available for a new registration.
    pub async fn delete_user(&self, user_id: Uuid) -> ResultEngine<()> {
        let now = Utc::now();
        let res = users::Entity::update_many()
            .col_expr(users::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(user_id.to_string()))
            .filter(users::Column::DeletedAt.is_null())
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        info!(%user_id, "user deleted");
        Ok(())
    }
}

fn unique_email_violation(err: DbErr, email: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            EngineError::DuplicateEmail(email.to_string())
        }
        _ => err.into(),
    }
}
