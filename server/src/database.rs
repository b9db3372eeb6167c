//! # Postgres
//!
//! System of record.
//!
//! ## Requirements
//!
//! - Reference catalogs in the low thousands of rows, read-mostly
//! - Exactly one voter row per national ID document
//! - Concurrent submissions for the same document must neither duplicate
//!   the row nor lose the later update
//!
//! ## Implementation
//!
//! - Plain foreign-keyed tables, provisioned idempotently at startup
//! - Catalog reads are filtered listings ordered by display name
//! - The voter write is a single `INSERT ... ON CONFLICT (document) DO
//!   UPDATE`, so the store serializes racing submissions
use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::models::{CatalogItem, LeaderItem, NewVoter};

pub const CATALOG_LIMIT: i64 = 50;

pub async fn init_postgres(database_url: &str) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .unwrap();

    init_schema(&pool).await.unwrap();

    pool
}

async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS departments (
            id   BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS municipalities (
            id            BIGSERIAL PRIMARY KEY,
            name          TEXT NOT NULL,
            department_id BIGINT NOT NULL REFERENCES departments(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS neighborhoods (
            id              BIGSERIAL PRIMARY KEY,
            name            TEXT NOT NULL,
            municipality_id BIGINT NOT NULL REFERENCES municipalities(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS coordinators (
            id   BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS leaders (
            id             BIGSERIAL PRIMARY KEY,
            name           TEXT NOT NULL,
            coordinator_id BIGINT NOT NULL REFERENCES coordinators(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS voters (
            id                 BIGSERIAL PRIMARY KEY,
            cluster            INTEGER NOT NULL DEFAULT 1,
            leader_id          BIGINT NOT NULL REFERENCES leaders(id),
            document           TEXT NOT NULL,
            first_name         TEXT NOT NULL,
            last_name          TEXT NOT NULL,
            address            TEXT NOT NULL,
            phone              TEXT NOT NULL,
            municipality_id    BIGINT NOT NULL REFERENCES municipalities(id),
            neighborhood_id    BIGINT NOT NULL REFERENCES neighborhoods(id),
            mode               TEXT NOT NULL DEFAULT 'public',
            consent            BOOLEAN NOT NULL,
            consent_at         TIMESTAMPTZ NOT NULL,
            consent_ip         TEXT NOT NULL,
            consent_user_agent TEXT NOT NULL,
            created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT uq_voters_document UNIQUE (document)
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_departments(pool: &PgPool) -> Result<Vec<CatalogItem>, sqlx::Error> {
    sqlx::query_as("SELECT id, name FROM departments ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn list_municipalities(
    pool: &PgPool,
    department_id: Option<i64>,
    department: Option<&str>,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT m.id, m.name FROM municipalities m
         JOIN departments d ON d.id = m.department_id
         WHERE ($1::BIGINT IS NULL OR m.department_id = $1)
           AND ($2::TEXT IS NULL OR d.name ILIKE $2)
         ORDER BY m.name",
    )
    .bind(department_id)
    .bind(department.map(|name| format!("%{name}%")))
    .fetch_all(pool)
    .await
}

pub async fn list_neighborhoods(
    pool: &PgPool,
    municipality_id: i64,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    sqlx::query_as("SELECT id, name FROM neighborhoods WHERE municipality_id = $1 ORDER BY name")
        .bind(municipality_id)
        .fetch_all(pool)
        .await
}

pub async fn list_coordinators(
    pool: &PgPool,
    search: Option<&str>,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name FROM coordinators
         WHERE ($1::TEXT IS NULL OR name ILIKE $1)
         ORDER BY name LIMIT $2",
    )
    .bind(search.map(|name| format!("%{name}%")))
    .bind(CATALOG_LIMIT)
    .fetch_all(pool)
    .await
}

pub async fn list_leaders(
    pool: &PgPool,
    coordinator_id: Option<i64>,
    search: Option<&str>,
) -> Result<Vec<LeaderItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, coordinator_id FROM leaders
         WHERE ($1::BIGINT IS NULL OR coordinator_id = $1)
           AND ($2::TEXT IS NULL OR name ILIKE $2)
         ORDER BY name LIMIT $3",
    )
    .bind(coordinator_id)
    .bind(search.map(|name| format!("%{name}%")))
    .bind(CATALOG_LIMIT)
    .fetch_all(pool)
    .await
}

pub async fn get_neighborhood_municipality(
    pool: &PgPool,
    id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT municipality_id FROM neighborhoods WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_leader(pool: &PgPool, id: i64) -> Result<Option<LeaderItem>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, coordinator_id FROM leaders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_coordinator(pool: &PgPool, id: i64) -> Result<Option<CatalogItem>, sqlx::Error> {
    sqlx::query_as("SELECT id, name FROM coordinators WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// consent is written as a literal: the handler never reaches this point
// with consent != true
const UPSERT_VOTER: &str = "INSERT INTO voters (
        cluster, leader_id, document, first_name, last_name, address, phone,
        municipality_id, neighborhood_id, mode, consent, consent_at, consent_ip,
        consent_user_agent, created_at, updated_at
    ) VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $11, $12, $13, $13)
    ON CONFLICT (document) DO UPDATE SET
        leader_id = EXCLUDED.leader_id,
        first_name = EXCLUDED.first_name,
        last_name = EXCLUDED.last_name,
        address = EXCLUDED.address,
        phone = EXCLUDED.phone,
        municipality_id = EXCLUDED.municipality_id,
        neighborhood_id = EXCLUDED.neighborhood_id,
        mode = EXCLUDED.mode,
        consent = EXCLUDED.consent,
        consent_at = EXCLUDED.consent_at,
        consent_ip = EXCLUDED.consent_ip,
        consent_user_agent = EXCLUDED.consent_user_agent,
        updated_at = EXCLUDED.updated_at";

/// Inserts or refreshes the voter row for `voter.document` and reports
/// whether a row with that document already existed.
///
/// The existence check only feeds the created/updated response message;
/// correctness under concurrent submissions comes from the conflict
/// clause of the insert itself.
pub async fn register_voter(pool: &PgPool, voter: &NewVoter) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM voters WHERE document = $1)")
            .bind(&voter.document)
            .fetch_one(&mut *tx)
            .await?;

    sqlx::query(UPSERT_VOTER)
        .bind(voter.leader_id)
        .bind(&voter.document)
        .bind(&voter.first_name)
        .bind(&voter.last_name)
        .bind(&voter.address)
        .bind(&voter.phone)
        .bind(voter.municipality_id)
        .bind(voter.neighborhood_id)
        .bind(voter.mode.as_str())
        .bind(voter.consent_at)
        .bind(&voter.consent_ip)
        .bind(&voter.consent_user_agent)
        .bind(voter.consent_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(existing)
}
