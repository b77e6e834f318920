use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        use_cases::{Paginated, Pagination, auth::AccountCredentials},
        validators::is_valid_phone,
    },
    domain::entities::fighter::{Assessment, Fighter, FighterProfileUpdate},
};

pub const MAX_NAME_LEN: usize = 100;

/// Row to insert for a newly registered fighter.
#[derive(Debug, Clone)]
pub struct NewFighter {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub belt_rank: Option<String>,
}

#[async_trait]
pub trait FighterRepo: Send + Sync {
    async fn create(&self, fighter: &NewFighter) -> AppResult<Fighter>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Fighter>>;
    async fn find_credentials(&self, email: &str) -> AppResult<Option<AccountCredentials>>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
    /// Newest first. `search` matches name or email, case-insensitively.
    async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> AppResult<(Vec<Fighter>, i64)>;
    /// Fighters with no subscription rows at all.
    async fn list_without_subscription(&self, page: Pagination) -> AppResult<(Vec<Fighter>, i64)>;
    async fn update_profile(
        &self,
        id: Uuid,
        update: &FighterProfileUpdate,
    ) -> AppResult<Option<Fighter>>;
    async fn set_assessment(&self, id: Uuid, assessment: &Assessment)
    -> AppResult<Option<Fighter>>;
    /// Removes the fighter and their subscriptions. Returns false if nothing matched.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct FighterUseCases {
    repo: Arc<dyn FighterRepo>,
}

impl FighterUseCases {
    pub fn new(repo: Arc<dyn FighterRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Fighter> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Fighter not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        search: Option<String>,
        page: Pagination,
    ) -> AppResult<Paginated<Fighter>> {
        let search = search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let (items, total) = self.repo.list(search, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    #[instrument(skip(self))]
    pub async fn without_subscription(&self, page: Pagination) -> AppResult<Paginated<Fighter>> {
        let (items, total) = self.repo.list_without_subscription(page).await?;
        Ok(Paginated::new(items, page, total))
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        mut update: FighterProfileUpdate,
    ) -> AppResult<Fighter> {
        if let Some(name) = update.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
                return Err(AppError::InvalidInput(format!(
                    "Name must be between 1 and {MAX_NAME_LEN} characters"
                )));
            }
        }
        if let Some(phone) = update.phone.as_deref()
            && !is_valid_phone(phone)
        {
            return Err(AppError::InvalidInput("Invalid phone number".into()));
        }
        if let Some(dob) = update.date_of_birth
            && dob > Utc::now().date_naive()
        {
            return Err(AppError::InvalidInput(
                "Date of birth cannot be in the future".into(),
            ));
        }

        let fighter = self
            .repo
            .update_profile(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound("Fighter not found".into()))?;
        tracing::info!(fighter_id = %id, "Fighter profile updated");
        Ok(fighter)
    }

    #[instrument(skip(self, assessment))]
    pub async fn update_assessment(
        &self,
        id: Uuid,
        mut assessment: Assessment,
    ) -> AppResult<Fighter> {
        if let Some(field) = assessment.out_of_range() {
            return Err(AppError::InvalidInput(format!(
                "Score for {field} must be between 0 and 10"
            )));
        }
        assessment.assessed_at.get_or_insert_with(Utc::now);

        let fighter = self
            .repo
            .set_assessment(id, &assessment)
            .await?
            .ok_or_else(|| AppError::NotFound("Fighter not found".into()))?;
        tracing::info!(
            fighter_id = %id,
            average = assessment.average(),
            "Fighter assessment recorded"
        );
        Ok(fighter)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Fighter not found".into()));
        }
        tracing::info!(fighter_id = %id, "Fighter deleted with their subscriptions");
        Ok(())
    }
}
