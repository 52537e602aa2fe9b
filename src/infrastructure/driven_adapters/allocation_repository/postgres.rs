//! PostgreSQL Allocation Repository Implementation
//!
//! Implements the AllocationRepository trait using SQLx for PostgreSQL.
//! The table's exclusion constraint and partial unique index make
//! `insert_active` a conditional insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::gateways::AllocationRepository;
use crate::domain::models::allocation::{AllocationStatus, NetworkAllocation, NetworkId, PageCursor};
use crate::domain::models::cidr::CidrBlock;
use crate::shared::errors::RepositoryError;

/// SQLSTATE raised when an EXCLUDE constraint rejects a row
const EXCLUSION_VIOLATION: &str = "23P01";

/// Database row representation for the network_allocations table
#[derive(Debug, sqlx::FromRow)]
struct AllocationRow {
    id: Uuid,
    network_id: String,
    cidr_block: String,
    name: Option<String>,
    status: String,
    allocated_at: DateTime<Utc>,
    released_at: Option<DateTime<Utc>>,
}

impl TryFrom<AllocationRow> for NetworkAllocation {
    type Error = RepositoryError;

    fn try_from(row: AllocationRow) -> Result<Self, Self::Error> {
        let network_id = NetworkId::try_from(row.network_id)
            .map_err(|e| RepositoryError::Mapping(format!("Failed to parse network_id: {}", e)))?;
        let cidr_block = row
            .cidr_block
            .parse::<CidrBlock>()
            .map_err(|e| RepositoryError::Mapping(format!("Failed to parse cidr_block: {}", e)))?;
        let status = row
            .status
            .parse::<AllocationStatus>()
            .map_err(|e| RepositoryError::Mapping(format!("Failed to parse status: {}", e)))?;

        Ok(NetworkAllocation::restore(
            row.id,
            network_id,
            cidr_block,
            row.name,
            status,
            row.allocated_at,
            row.released_at,
        ))
    }
}

/// PostgreSQL implementation of AllocationRepository
pub struct PostgresAllocationRepository {
    pool: PgPool,
}

impl PostgresAllocationRepository {
    /// Create a new PostgresAllocationRepository
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AllocationRepository for PostgresAllocationRepository {
    async fn find_active_by_network_id(
        &self,
        network_id: &NetworkId,
    ) -> Result<Option<NetworkAllocation>, RepositoryError> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, network_id, cidr_block::text AS cidr_block, name, status,
                   allocated_at, released_at
            FROM network_allocations
            WHERE network_id = $1 AND status = 'ACTIVE'
            "#,
        )
        .bind(network_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(NetworkAllocation::try_from).transpose()
    }

    async fn find_all_active(&self) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        let rows = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, network_id, cidr_block::text AS cidr_block, name, status,
                   allocated_at, released_at
            FROM network_allocations
            WHERE status = 'ACTIVE'
            ORDER BY network_allocations.cidr_block ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NetworkAllocation::try_from).collect()
    }

    async fn find_active_page(
        &self,
        after: Option<&PageCursor>,
        limit: u32,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        let rows = match after {
            Some(cursor) => {
                sqlx::query_as::<_, AllocationRow>(
                    r#"
                    SELECT id, network_id, cidr_block::text AS cidr_block, name, status,
                           allocated_at, released_at
                    FROM network_allocations
                    WHERE status = 'ACTIVE'
                      AND (allocated_at, network_id COLLATE "C") > ($1, $2)
                    ORDER BY allocated_at ASC, network_id COLLATE "C" ASC
                    LIMIT $3
                    "#,
                )
                .bind(cursor.allocated_at())
                .bind(cursor.network_id().as_str())
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AllocationRow>(
                    r#"
                    SELECT id, network_id, cidr_block::text AS cidr_block, name, status,
                           allocated_at, released_at
                    FROM network_allocations
                    WHERE status = 'ACTIVE'
                    ORDER BY allocated_at ASC, network_id COLLATE "C" ASC
                    LIMIT $1
                    "#,
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(NetworkAllocation::try_from).collect()
    }

    async fn find_active_overlapping(
        &self,
        cidr_block: &CidrBlock,
    ) -> Result<Vec<NetworkAllocation>, RepositoryError> {
        let rows = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT id, network_id, cidr_block::text AS cidr_block, name, status,
                   allocated_at, released_at
            FROM network_allocations
            WHERE status = 'ACTIVE' AND cidr_block && $1::cidr
            ORDER BY network_allocations.cidr_block ASC
            "#,
        )
        .bind(cidr_block.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NetworkAllocation::try_from).collect()
    }

    async fn insert_active(&self, allocation: &NetworkAllocation) -> Result<NetworkAllocation, RepositoryError> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            INSERT INTO network_allocations (
                id, network_id, cidr_block, name, status, allocated_at, released_at
            )
            VALUES ($1, $2, $3::cidr, $4, 'ACTIVE', $5, NULL)
            RETURNING id, network_id, cidr_block::text AS cidr_block, name, status,
                      allocated_at, released_at
            "#,
        )
        .bind(allocation.id())
        .bind(allocation.network_id().as_str())
        .bind(allocation.cidr_block().to_string())
        .bind(allocation.name())
        .bind(allocation.allocated_at())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) => {
                RepositoryError::Overlap(allocation.cidr_block().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::DuplicateNetwork(allocation.network_id().to_string())
            }
            _ => RepositoryError::from(e),
        })?;

        NetworkAllocation::try_from(row)
    }

    async fn release(
        &self,
        network_id: &NetworkId,
        released_at: DateTime<Utc>,
    ) -> Result<Option<NetworkAllocation>, RepositoryError> {
        let row = sqlx::query_as::<_, AllocationRow>(
            r#"
            UPDATE network_allocations
            SET status = 'RELEASED', released_at = $2
            WHERE network_id = $1 AND status = 'ACTIVE'
            RETURNING id, network_id, cidr_block::text AS cidr_block, name, status,
                      allocated_at, released_at
            "#,
        )
        .bind(network_id.as_str())
        .bind(released_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NetworkAllocation::try_from).transpose()
    }
}
