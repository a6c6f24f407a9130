//! Company repository: read access to operations-start dates.

use async_trait::async_trait;
use chrono::NaiveDate;
use periodlock_core::period::{CompanyDirectory, PeriodError};
use periodlock_shared::types::TenantId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use crate::entities::companies;

/// Company repository backed by the `companies` table.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: TenantId) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Creates a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        operations_start: Option<NaiveDate>,
    ) -> Result<companies::Model, DbErr> {
        let now = chrono::Utc::now().into();

        companies::ActiveModel {
            id: Set(TenantId::new().into_inner()),
            name: Set(name.to_string()),
            operations_start: Set(operations_start),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }
}

#[async_trait]
impl CompanyDirectory for CompanyRepository {
    async fn operations_start(&self, tenant: TenantId) -> Result<Option<NaiveDate>, PeriodError> {
        let company = self
            .find_by_id(tenant)
            .await
            .map_err(|e| PeriodError::Storage(e.to_string()))?;

        Ok(company.and_then(|c| c.operations_start))
    }
}
