use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    repo::{UserStore, UserTx},
    repo_types::{Gamification, NewUser, ProfileChanges, User},
};
use crate::db::{StoreError, StoreResult};

/// In-process user store with the same uniqueness rules as the Postgres one.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count_by_email(&self, email: &str) -> usize {
        self.users
            .lock()
            .await
            .values()
            .filter(|u| u.email == email)
            .count()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let mut all: Vec<User> = self.users.lock().await.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn begin(&self) -> StoreResult<Box<dyn UserTx>> {
        Ok(Box::new(MemoryUserTx {
            users: self.users.clone(),
            staged: Vec::new(),
        }))
    }

    async fn set_remember_me(&self, id: Uuid, remember_me: bool) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.remember_me = Some(remember_me);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().await;
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(StoreError::Conflict("users_email_key".into()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

pub struct MemoryUserTx {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    staged: Vec<User>,
}

#[async_trait]
impl UserTx for MemoryUserTx {
    async fn create_user(&mut self, new_user: &NewUser) -> StoreResult<User> {
        let users = self.users.lock().await;
        let staged_dup = self.staged.iter().any(|u| u.email == new_user.email);
        if staged_dup || email_taken(&users, &new_user.email, None) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new_user.id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            remember_me: new_user.remember_me,
            gamification: Gamification::default(),
            created_at: now,
            updated_at: now,
        };
        self.staged.push(user.clone());
        Ok(user)
    }

    /// Re-checks uniqueness under the lock, so of two racing transactions for
    /// one email only the first commit lands.
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUserTx { users, staged } = *self;
        let mut users = users.lock().await;
        if staged.iter().any(|u| email_taken(&users, &u.email, None)) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        for user in staged {
            users.insert(user.id, user);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            remember_me: None,
        }
    }

    #[tokio::test]
    async fn staged_user_is_invisible_until_commit() {
        let store = MemoryUserStore::new();
        let mut tx = store.begin().await.unwrap();
        let created = tx.create_user(&new_user("a@example.com")).await.unwrap();
        assert!(store.find_by_id(created.id).await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert!(store.find_by_id(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rollback_discards_staged_user() {
        let store = MemoryUserStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_user(&new_user("a@example.com")).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_commit_for_same_email_conflicts() {
        let store = MemoryUserStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.create_user(&new_user("race@example.com")).await.unwrap();
        second.create_user(&new_user("race@example.com")).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_by_email("race@example.com").await, 1);
    }

    #[tokio::test]
    async fn profile_email_change_respects_uniqueness() {
        let store = MemoryUserStore::new();
        let mut tx = store.begin().await.unwrap();
        let a = tx.create_user(&new_user("a@example.com")).await.unwrap();
        tx.create_user(&new_user("b@example.com")).await.unwrap();
        tx.commit().await.unwrap();

        let changes = ProfileChanges {
            username: None,
            email: Some("b@example.com".into()),
        };
        let err = store.update_profile(a.id, &changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let changes = ProfileChanges {
            username: Some("alpha".into()),
            email: None,
        };
        let updated = store.update_profile(a.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.username, "alpha");
        assert_eq!(updated.email, "a@example.com");
    }
}
