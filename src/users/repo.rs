use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::users::repo_types::{NewUser, ProfileChanges, Role, User};

pub const EMAIL_TAKEN: &str = "Email is already registered";

const USER_COLUMNS: &str = "id, email, password_hash, role, name, last_name, middle_name, gender, birth_date, created_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn list(&self) -> Result<Vec<User>, ApiError>;
    /// Fails with an `email` validation error when the address is taken.
    async fn create(&self, user: NewUser) -> Result<User, ApiError>;
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, ApiError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pub db: PgPool,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, ApiError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(ApiError::field("email", EMAIL_TAKEN))
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, ApiError> {
        // For nullable columns a flag says whether the value was supplied at all.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name        = COALESCE($2, name),
                last_name   = CASE WHEN $3 THEN $4 ELSE last_name END,
                middle_name = CASE WHEN $5 THEN $6 ELSE middle_name END,
                gender      = CASE WHEN $7 THEN $8 ELSE gender END,
                birth_date  = CASE WHEN $9 THEN $10 ELSE birth_date END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.last_name.is_some())
        .bind(changes.last_name.clone().flatten())
        .bind(changes.middle_name.is_some())
        .bind(changes.middle_name.clone().flatten())
        .bind(changes.gender.is_some())
        .bind(changes.gender.flatten())
        .bind(changes.birth_date.is_some())
        .bind(changes.birth_date.flatten())
        .fetch_optional(&self.db)
        .await
        .context("update user profile")?;
        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.db)
        .await
        .context("set user role")?;
        Ok(user)
    }
}

#[cfg(test)]
pub use memory::InMemoryUserRepository;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<User>, ApiError> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn create(&self, user: NewUser) -> Result<User, ApiError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(ApiError::field("email", EMAIL_TAKEN));
            }
            let created = User {
                id: Uuid::new_v4(),
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                name: user.name,
                last_name: None,
                middle_name: None,
                gender: None,
                birth_date: None,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(created.clone());
            Ok(created)
        }

        async fn update_profile(
            &self,
            id: Uuid,
            changes: &ProfileChanges,
        ) -> Result<Option<User>, ApiError> {
            let mut users = self.users.lock().unwrap();
            let Some(user) = users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            if let Some(name) = &changes.name {
                user.name = name.clone();
            }
            if let Some(last_name) = &changes.last_name {
                user.last_name = last_name.clone();
            }
            if let Some(middle_name) = &changes.middle_name {
                user.middle_name = middle_name.clone();
            }
            if let Some(gender) = changes.gender {
                user.gender = gender;
            }
            if let Some(birth_date) = changes.birth_date {
                user.birth_date = birth_date;
            }
            Ok(Some(user.clone()))
        }

        async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, ApiError> {
            let mut users = self.users.lock().unwrap();
            Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
                u.role = role;
                u.clone()
            }))
        }
    }
}
