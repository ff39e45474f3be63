use crate::error::Result;
use crate::fields;
use crate::models::UserProfile;
use crate::store::{paths, DocumentStore};
use tracing::debug;

pub struct UserRepository;

impl UserRepository {
    pub async fn get_profile(store: &dyn DocumentStore, uid: &str) -> Result<Option<UserProfile>> {
        let doc = store.get_document(&paths::user(uid)).await?;
        Ok(doc.as_ref().map(UserProfile::from_document))
    }

    /// The user's electricity rate, if one has been saved.
    pub async fn get_rate(store: &dyn DocumentStore, uid: &str) -> Result<Option<f64>> {
        Ok(Self::get_profile(store, uid).await?.and_then(|p| p.rate))
    }

    pub async fn save_profile(store: &dyn DocumentStore, profile: &UserProfile) -> Result<()> {
        store
            .set_document(&paths::user(&profile.uid), profile.to_fields())
            .await?;
        debug!("Saved profile for {}", profile.uid);
        Ok(())
    }

    pub async fn update_name(store: &dyn DocumentStore, uid: &str, name: &str) -> Result<()> {
        store
            .update_document(&paths::user(uid), fields! { "name" => name })
            .await
    }

    pub async fn update_rate(store: &dyn DocumentStore, uid: &str, rate: f64) -> Result<()> {
        store
            .update_document(&paths::user(uid), fields! { "rate" => rate })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let store = InMemoryStore::new();
        assert!(UserRepository::get_profile(&store, "u1").await.unwrap().is_none());

        let profile = UserProfile::new("u1", "Sam", "sam@example.com", None);
        UserRepository::save_profile(&store, &profile).await.unwrap();
        UserRepository::update_rate(&store, "u1", 0.25).await.unwrap();
        UserRepository::update_name(&store, "u1", "Samira").await.unwrap();

        let loaded = UserRepository::get_profile(&store, "u1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Samira");
        assert_eq!(loaded.email, "sam@example.com");
        assert_eq!(UserRepository::get_rate(&store, "u1").await.unwrap(), Some(0.25));
    }

    #[tokio::test]
    async fn test_update_missing_profile_fails() {
        let store = InMemoryStore::new();
        let result = UserRepository::update_name(&store, "ghost", "x").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
