use async_trait::async_trait;
use clinipay_application::SettingsRepository;
use clinipay_core::{AppError, AppResult};
use clinipay_domain::SiteSettings;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory storage for the site settings singleton.
#[derive(Debug, Default)]
pub struct InMemorySettingsRepository {
    stored: RwLock<Option<SiteSettings>>,
}

impl InMemorySettingsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> AppResult<Option<SiteSettings>> {
        Ok(self.stored.read().await.clone())
    }

    async fn insert(&self, mut settings: SiteSettings) -> AppResult<SiteSettings> {
        settings.id = Some(Uuid::new_v4());
        *self.stored.write().await = Some(settings.clone());
        Ok(settings)
    }

    async fn update(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        let mut stored = self.stored.write().await;
        match stored.as_ref() {
            Some(current) if current.id == settings.id => {
                *stored = Some(settings.clone());
                Ok(settings)
            }
            _ => Err(AppError::NotFound("site settings".to_owned())),
        }
    }
}
