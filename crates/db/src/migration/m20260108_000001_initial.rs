//! Initial database migration.
//!
//! Creates the period status enums, the companies table read for the
//! operations-start boundary, accounting periods and their audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;

        // ============================================================
        // PART 3: PERIOD LIFECYCLE
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;
        db.execute_unprepared(PERIOD_EVENTS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Period status
CREATE TYPE period_status AS ENUM ('open', 'closed');

-- Audit action
CREATE TYPE period_action AS ENUM ('closed', 'reopened');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    -- Normalized to the first of its month when read
    operations_start DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    status period_status NOT NULL DEFAULT 'open',
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    reopened_by UUID,
    reopened_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_period_month CHECK (month BETWEEN 1 AND 12),
    CONSTRAINT chk_closed_audit CHECK (
        status = 'open' OR (closed_by IS NOT NULL AND closed_at IS NOT NULL)
    ),
    UNIQUE (company_id, year, month)
);

CREATE INDEX idx_accounting_periods_closed ON accounting_periods(company_id, year, month)
    WHERE status = 'closed';
";

const PERIOD_EVENTS_SQL: &str = r"
CREATE TABLE period_events (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id),
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    action period_action NOT NULL,
    actor_id UUID NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_event_month CHECK (month BETWEEN 1 AND 12)
);

CREATE INDEX idx_period_events_period ON period_events(company_id, year, month, occurred_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION update_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_companies_updated_at
    BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION update_updated_at();

CREATE TRIGGER trg_accounting_periods_updated_at
    BEFORE UPDATE ON accounting_periods
    FOR EACH ROW EXECUTE FUNCTION update_updated_at();

-- The audit log is append-only
CREATE OR REPLACE FUNCTION prevent_period_event_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'period_events is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_period_events_immutable
    BEFORE UPDATE OR DELETE ON period_events
    FOR EACH ROW EXECUTE FUNCTION prevent_period_event_mutation();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS period_events CASCADE;
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
DROP FUNCTION IF EXISTS prevent_period_event_mutation() CASCADE;
DROP FUNCTION IF EXISTS update_updated_at() CASCADE;
DROP TYPE IF EXISTS period_action;
DROP TYPE IF EXISTS period_status;
";
