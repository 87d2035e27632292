//! `transfer_mappings` / `transfer_metrics` repositories (component G).

use sqlx::SqlitePool;

use crate::domain::error::DomainResult;
use crate::domain::models::learning::{TransferMapping, TransferMetrics};

#[derive(sqlx::FromRow)]
struct MappingRow {
    id: String,
    source_domain: String,
    target_domain: String,
    similarity: f64,
    transfer_coefficient: f64,
    experiences_transferred: i64,
    success_rate: f64,
}

impl From<MappingRow> for TransferMapping {
    fn from(row: MappingRow) -> Self {
        Self {
            id: row.id,
            source_domain: row.source_domain,
            target_domain: row.target_domain,
            similarity: row.similarity,
            transfer_coefficient: row.transfer_coefficient,
            experiences_transferred: row.experiences_transferred.max(0) as u64,
            success_rate: row.success_rate,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetricsRow {
    total_transfers: i64,
    successful: i64,
    failed: i64,
    avg_performance_gain: f64,
    transfer_efficiency: f64,
}

impl From<MetricsRow> for TransferMetrics {
    fn from(row: MetricsRow) -> Self {
        Self {
            total_transfers: row.total_transfers.max(0) as u64,
            successful: row.successful.max(0) as u64,
            failed: row.failed.max(0) as u64,
            avg_performance_gain: row.avg_performance_gain,
            transfer_efficiency: row.transfer_efficiency,
        }
    }
}

pub struct SqliteTransferRepository {
    pool: SqlitePool,
}

impl SqliteTransferRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save_mapping(&self, mapping: &TransferMapping) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO transfer_mappings (id, source_domain, target_domain, similarity, transfer_coefficient, experiences_transferred, success_rate)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET similarity = excluded.similarity, transfer_coefficient = excluded.transfer_coefficient,
                experiences_transferred = excluded.experiences_transferred, success_rate = excluded.success_rate",
        )
        .bind(&mapping.id)
        .bind(&mapping.source_domain)
        .bind(&mapping.target_domain)
        .bind(mapping.similarity)
        .bind(mapping.transfer_coefficient)
        .bind(mapping.experiences_transferred as i64)
        .bind(mapping.success_rate)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_mapping(&self, source_domain: &str, target_domain: &str) -> DomainResult<Option<TransferMapping>> {
        let row: Option<MappingRow> = sqlx::query_as(
            "SELECT * FROM transfer_mappings WHERE source_domain = ? AND target_domain = ?",
        )
        .bind(source_domain)
        .bind(target_domain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn metrics(&self) -> DomainResult<TransferMetrics> {
        let row: Option<MetricsRow> =
            sqlx::query_as("SELECT total_transfers, successful, failed, avg_performance_gain, transfer_efficiency FROM transfer_metrics WHERE id = 'global'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map_or_else(TransferMetrics::default, Into::into))
    }

    pub async fn save_metrics(&self, metrics: &TransferMetrics) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO transfer_metrics (id, total_transfers, successful, failed, avg_performance_gain, transfer_efficiency)
             VALUES ('global', ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET total_transfers = excluded.total_transfers, successful = excluded.successful,
                failed = excluded.failed, avg_performance_gain = excluded.avg_performance_gain, transfer_efficiency = excluded.transfer_efficiency",
        )
        .bind(metrics.total_transfers as i64)
        .bind(metrics.successful as i64)
        .bind(metrics.failed as i64)
        .bind(metrics.avg_performance_gain)
        .bind(metrics.transfer_efficiency)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
