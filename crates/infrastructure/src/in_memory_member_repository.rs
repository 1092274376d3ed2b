use std::collections::HashMap;

use async_trait::async_trait;
use clinipay_application::{MemberProfile, MemberRepository, YtdFigures};
use clinipay_core::{AppError, AppResult, ClinicId, MemberId};
use tokio::sync::RwLock;

/// In-memory member repository for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    members: RwLock<HashMap<(ClinicId, MemberId), MemberProfile>>,
}

impl InMemoryMemberRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a member.
    pub async fn upsert(&self, profile: MemberProfile) {
        let mut members = self.members.write().await;
        members.insert((profile.clinic_id, profile.member_id), profile);
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find_member(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
    ) -> AppResult<Option<MemberProfile>> {
        let members = self.members.read().await;
        Ok(members.get(&(clinic_id, member_id)).cloned())
    }

    async fn update_ytd(
        &self,
        clinic_id: ClinicId,
        member_id: MemberId,
        ytd: YtdFigures,
    ) -> AppResult<()> {
        let mut members = self.members.write().await;
        let member = members
            .get_mut(&(clinic_id, member_id))
            .ok_or_else(|| AppError::NotFound(format!("member {member_id}")))?;
        member.ytd = ytd;
        Ok(())
    }
}
