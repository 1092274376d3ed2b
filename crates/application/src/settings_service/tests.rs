use std::sync::Arc;

use async_trait::async_trait;
use clinipay_core::{AppError, AppResult, UserIdentity};
use clinipay_domain::{SiteSettings, TaxBracket};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::payroll_ports::SettingsRepository;

use super::SettingsService;

fn staff() -> UserIdentity {
    UserIdentity::new("staff-1", "Robin Clerk", None, true)
}

fn practitioner() -> UserIdentity {
    UserIdentity::new("member-1", "Dana Reid", None, false)
}

fn valid_settings() -> SiteSettings {
    SiteSettings {
        id: None,
        federal_tax_brackets: vec![TaxBracket {
            tax_rate: 0.15,
            min_income: 0.0,
            max_income: 50_000.0,
        }],
        provincial_tax_brackets: vec![TaxBracket {
            tax_rate: 0.05,
            min_income: 0.0,
            max_income: 40_000.0,
        }],
        cpp: 0.0595,
        cpp_exemption: 3_500.0,
        cpp_cap: 3_867.5,
        ei_ee: 0.0166,
        ei_er: 0.0232,
        ei_cap: 1_049.12,
        vacation_pay_rate: 0.04,
        overtime_pay_rate: 1.5,
    }
}

#[derive(Default)]
struct FakeSettingsRepository {
    stored: Mutex<Option<SiteSettings>>,
    inserts: Mutex<usize>,
    updates: Mutex<usize>,
}

#[async_trait]
impl SettingsRepository for FakeSettingsRepository {
    async fn load(&self) -> AppResult<Option<SiteSettings>> {
        Ok(self.stored.lock().await.clone())
    }

    async fn insert(&self, mut settings: SiteSettings) -> AppResult<SiteSettings> {
        *self.inserts.lock().await += 1;
        settings.id = Some(Uuid::new_v4());
        *self.stored.lock().await = Some(settings.clone());
        Ok(settings)
    }

    async fn update(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        *self.updates.lock().await += 1;
        let mut stored = self.stored.lock().await;
        if stored.as_ref().and_then(|current| current.id) != settings.id {
            return Err(AppError::NotFound("site settings".to_owned()));
        }
        *stored = Some(settings.clone());
        Ok(settings)
    }
}

#[tokio::test]
async fn get_before_first_save_is_not_found() {
    let service = SettingsService::new(Arc::new(FakeSettingsRepository::default()));
    let result = service.get(&staff()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn non_staff_cannot_read_or_save() {
    let service = SettingsService::new(Arc::new(FakeSettingsRepository::default()));

    assert!(matches!(
        service.get(&practitioner()).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.save(&practitioner(), valid_settings()).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn first_save_inserts_and_assigns_an_id() {
    let repository = Arc::new(FakeSettingsRepository::default());
    let service = SettingsService::new(Arc::clone(&repository) as Arc<dyn SettingsRepository>);

    let saved = service
        .save(&staff(), valid_settings())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(saved.id.is_some());
    assert_eq!(*repository.inserts.lock().await, 1);
    assert_eq!(*repository.updates.lock().await, 0);
}

#[tokio::test]
async fn save_with_an_id_updates_the_stored_row() {
    let repository = Arc::new(FakeSettingsRepository::default());
    let service = SettingsService::new(Arc::clone(&repository) as Arc<dyn SettingsRepository>);

    let mut saved = service
        .save(&staff(), valid_settings())
        .await
        .unwrap_or_else(|_| unreachable!());
    saved.vacation_pay_rate = 0.06;
    service
        .save(&staff(), saved)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(*repository.updates.lock().await, 1);
    let stored = repository.stored.lock().await;
    let stored = stored.as_ref().unwrap_or_else(|| unreachable!());
    assert_eq!(stored.vacation_pay_rate, 0.06);
}

#[tokio::test]
async fn invalid_settings_never_reach_the_repository() {
    let repository = Arc::new(FakeSettingsRepository::default());
    let service = SettingsService::new(Arc::clone(&repository) as Arc<dyn SettingsRepository>);

    let mut settings = valid_settings();
    settings.cpp_cap = settings.cpp_exemption;
    let result = service.save(&staff(), settings).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(*repository.inserts.lock().await, 0);
    assert_eq!(*repository.updates.lock().await, 0);
}
