use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};

use crate::db::Store;
use crate::entities::{credential, driver, passenger};
use crate::error::{AppError, AppResult};
use crate::utils::password;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Driver => f.write_str("driver"),
            Role::Passenger => f.write_str("passenger"),
        }
    }
}

/// An authenticated user. A detached value, not a handle into the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSession {
    pub id: i32,
    pub username: String,
    pub rating: f64,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub rating: f64,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>, rating: f64) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            rating,
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("username must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("password must not be empty".to_string()));
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 0 and 5, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

/// Registration and authentication for drivers and passengers.
#[derive(Clone, Debug)]
pub struct AccountService {
    store: Store,
}

impl AccountService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates the driver or passenger together with its credential.
    pub async fn register(&self, role: Role, registration: Registration) -> AppResult<UserSession> {
        registration.validate()?;

        let salt = password::generate_salt();
        let digest = password::hash(&registration.password, &salt)?;
        let username = registration.username.trim().to_string();
        let rating = registration.rating;

        let session = self
            .store
            .transaction(move |txn| {
                Box::pin(insert_account(txn, role, username, rating, digest, salt))
            })
            .await?;

        tracing::info!(role = %session.role, user_id = session.id, "account registered");
        Ok(session)
    }

    /// Verifies a username/password pair for `role`.
    ///
    /// Every failure, whether the username is unknown, has no credential, or the
    /// password is wrong, comes back as the same `AuthFailure`.
    pub async fn authenticate(
        &self,
        role: Role,
        username: &str,
        password: &str,
    ) -> AppResult<UserSession> {
        let username = username.trim().to_string();

        let found = self
            .store
            .transaction(move |txn| Box::pin(load_login(txn, role, username)))
            .await?;

        let Some((session, credential)) = found else {
            tracing::debug!(%role, "authentication failed: unknown user");
            return Err(AppError::AuthFailure);
        };

        if !password::verify(password, &credential.password_digest, &credential.salt) {
            tracing::debug!(%role, user_id = session.id, "authentication failed: bad password");
            return Err(AppError::AuthFailure);
        }

        Ok(session)
    }
}

/// The account row is the transaction's first write, so the UNIQUE index
/// decides between concurrent registrations of one name.
fn duplicate_username(err: DbErr, role: Role, username: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{} {} already exists", role, username))
        }
        _ => AppError::from(err),
    }
}

async fn insert_account(
    txn: &DatabaseTransaction,
    role: Role,
    username: String,
    rating: f64,
    digest: String,
    salt: String,
) -> AppResult<UserSession> {
    let now = Utc::now();

    let (id, credential) = match role {
        Role::Driver => {
            let driver = driver::ActiveModel {
                username: Set(username.clone()),
                rating: Set(rating),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|err| duplicate_username(err, role, &username))?;

            (
                driver.id,
                credential::ActiveModel {
                    driver_id: Set(Some(driver.id)),
                    passenger_id: Set(None),
                    ..Default::default()
                },
            )
        }
        Role::Passenger => {
            let passenger = passenger::ActiveModel {
                username: Set(username.clone()),
                rating: Set(rating),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await
            .map_err(|err| duplicate_username(err, role, &username))?;

            (
                passenger.id,
                credential::ActiveModel {
                    driver_id: Set(None),
                    passenger_id: Set(Some(passenger.id)),
                    ..Default::default()
                },
            )
        }
    };

    credential::ActiveModel {
        password_digest: Set(digest),
        salt: Set(salt),
        ..credential
    }
    .insert(txn)
    .await?;

    Ok(UserSession {
        id,
        username,
        rating,
        role,
    })
}

/// Resolves a username to its account and credential. With duplicate usernames
/// the lowest id wins.
async fn load_login(
    txn: &DatabaseTransaction,
    role: Role,
    username: String,
) -> AppResult<Option<(UserSession, credential::Model)>> {
    let (session, credential) = match role {
        Role::Driver => {
            let Some(driver) = driver::Entity::find()
                .filter(driver::Column::Username.eq(&username))
                .order_by_asc(driver::Column::Id)
                .one(txn)
                .await?
            else {
                return Ok(None);
            };

            let credential = credential::Entity::find()
                .filter(credential::Column::DriverId.eq(driver.id))
                .one(txn)
                .await?;

            (
                UserSession {
                    id: driver.id,
                    username: driver.username,
                    rating: driver.rating,
                    role,
                },
                credential,
            )
        }
        Role::Passenger => {
            let Some(passenger) = passenger::Entity::find()
                .filter(passenger::Column::Username.eq(&username))
                .order_by_asc(passenger::Column::Id)
                .one(txn)
                .await?
            else {
                return Ok(None);
            };

            let credential = credential::Entity::find()
                .filter(credential::Column::PassengerId.eq(passenger.id))
                .one(txn)
                .await?;

            (
                UserSession {
                    id: passenger.id,
                    username: passenger.username,
                    rating: passenger.rating,
                    role,
                },
                credential,
            )
        }
    };

    Ok(credential.map(|credential| (session, credential)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        assert!(Registration::new("anna", "pw", 4.5).validate().is_ok());
        assert!(matches!(
            Registration::new("  ", "pw", 4.5).validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::new("anna", "", 4.5).validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::new("anna", "pw", 5.1).validate(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Registration::new("anna", "pw", f64::NAN).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Driver.to_string(), "driver");
        assert_eq!(Role::Passenger.to_string(), "passenger");
    }
}
