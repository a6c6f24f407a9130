//! `SeaORM` entity definitions.

pub mod accounting_periods;
pub mod companies;
pub mod period_events;
pub mod sea_orm_active_enums;
