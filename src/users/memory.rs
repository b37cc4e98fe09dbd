use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewUser, Role, User, UserPatch};
use super::repo::{StoreError, StoreResult, UserStore};

/// In-process store for tests. Mirrors the unique email index of the Postgres schema.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_role(&self, id: Uuid, role: Role) {
        if let Some(u) = self.users.write().await.get_mut(&id) {
            u.role = role;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            age: None,
            gender: None,
            photo_url: user.photo_url,
            about: None,
            skills: Vec::new(),
            role: Role::Member,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(u) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.photo_url {
            u.photo_url = v;
        }
        if let Some(v) = patch.about {
            u.about = Some(v);
        }
        if let Some(v) = patch.gender {
            u.gender = Some(v);
        }
        if let Some(v) = patch.age {
            u.age = Some(v);
        }
        if let Some(v) = patch.skills {
            u.skills = v;
        }
        u.updated_at = OffsetDateTime::now_utc();
        Ok(Some(u.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Alice".into(),
            last_name: None,
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            photo_url: "https://example.com/a.png".into(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@x.com")).await.expect("first insert");
        let err = store.insert(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@x.com")).await.unwrap();
        let patch = UserPatch {
            age: Some(30),
            ..Default::default()
        };
        let updated = store.update(user.id, patch).await.unwrap().expect("user exists");
        assert_eq!(updated.age, Some(30));
        assert_eq!(updated.photo_url, user.photo_url);
        assert_eq!(updated.email, user.email);
    }

    #[tokio::test]
    async fn delete_reports_missing_ids() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("a@x.com")).await.unwrap();
        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }
}
