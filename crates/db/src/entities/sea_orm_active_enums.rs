//! `SeaORM` active enums mapped to PostgreSQL enum types.

use periodlock_core::period::PeriodAction as DomainPeriodAction;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `period_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_status")]
pub enum PeriodStatus {
    /// Period accepts postings.
    #[sea_orm(string_value = "open")]
    Open,
    /// Period is locked.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// `period_action` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "period_action")]
pub enum PeriodAction {
    /// Period was closed.
    #[sea_orm(string_value = "closed")]
    Closed,
    /// Period was reopened.
    #[sea_orm(string_value = "reopened")]
    Reopened,
}

impl From<DomainPeriodAction> for PeriodAction {
    fn from(action: DomainPeriodAction) -> Self {
        match action {
            DomainPeriodAction::Closed => Self::Closed,
            DomainPeriodAction::Reopened => Self::Reopened,
        }
    }
}

impl From<PeriodAction> for DomainPeriodAction {
    fn from(action: PeriodAction) -> Self {
        match action {
            PeriodAction::Closed => Self::Closed,
            PeriodAction::Reopened => Self::Reopened,
        }
    }
}
