use std::fmt::Display;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hubster_core::{
    LinkStatus, PaymentRecord, Proposal, ProposalLink, ProposalLinkStore, ProposalPatch,
    ProposalStore, Receivable, ReceivablePatch, ReceivableStore, StoreError,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

const PROPOSAL_COLUMNS: &str = r#"
    id, client, phone, value, category, proposal_type, description, proposal_date, status,
    user_id, link_id, link_expires_at, payment_id, payment_status, payment_status_detail,
    payment_date, payment_updated_at, version, created_at, updated_at
"#;

fn backend<E: Display>(err: E) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn proposal_from_row(row: &PgRow) -> Result<Proposal, StoreError> {
    let category: String = row.try_get("category").map_err(backend)?;
    let proposal_type: String = row.try_get("proposal_type").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;

    let payment_id: Option<String> = row.try_get("payment_id").map_err(backend)?;
    let payment = match payment_id {
        Some(payment_id) => {
            let payment_date: Option<DateTime<Utc>> =
                row.try_get("payment_date").map_err(backend)?;
            let payment_updated_at: Option<DateTime<Utc>> =
                row.try_get("payment_updated_at").map_err(backend)?;
            let updated_at = payment_updated_at.unwrap_or_else(Utc::now);
            Some(PaymentRecord {
                payment_id,
                payment_status: row
                    .try_get::<Option<String>, _>("payment_status")
                    .map_err(backend)?
                    .unwrap_or_default(),
                payment_status_detail: row.try_get("payment_status_detail").map_err(backend)?,
                payment_date: payment_date.unwrap_or(updated_at),
                payment_updated_at: updated_at,
            })
        }
        None => None,
    };

    Ok(Proposal {
        id: row.try_get("id").map_err(backend)?,
        client: row.try_get("client").map_err(backend)?,
        phone: row.try_get("phone").map_err(backend)?,
        value: row.try_get("value").map_err(backend)?,
        category: category.parse().map_err(backend)?,
        proposal_type: proposal_type.parse().map_err(backend)?,
        description: row.try_get("description").map_err(backend)?,
        date: row.try_get("proposal_date").map_err(backend)?,
        status: status.parse().map_err(backend)?,
        user_id: row.try_get("user_id").map_err(backend)?,
        link_id: row.try_get("link_id").map_err(backend)?,
        link_expires_at: row.try_get("link_expires_at").map_err(backend)?,
        payment,
        version: row.try_get("version").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn link_from_row(row: &PgRow) -> Result<ProposalLink, StoreError> {
    let status: String = row.try_get("status").map_err(backend)?;
    Ok(ProposalLink {
        id: row.try_get("id").map_err(backend)?,
        proposal_id: row.try_get("proposal_id").map_err(backend)?,
        status: status.parse().map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
        expires_at: row.try_get("expires_at").map_err(backend)?,
        payment_id: row.try_get("payment_id").map_err(backend)?,
        payment_status: row.try_get("payment_status").map_err(backend)?,
    })
}

const RECEIVABLE_COLUMNS: &str = r#"
    id, proposal_id, client, value, due_date, status, user_id, created_at, updated_at
"#;

fn receivable_from_row(row: &PgRow) -> Result<Receivable, StoreError> {
    let status: String = row.try_get("status").map_err(backend)?;
    Ok(Receivable {
        id: row.try_get("id").map_err(backend)?,
        proposal_id: row.try_get("proposal_id").map_err(backend)?,
        client: row.try_get("client").map_err(backend)?,
        value: row.try_get("value").map_err(backend)?,
        due_date: row.try_get("due_date").map_err(backend)?,
        status: status.parse().map_err(backend)?,
        user_id: row.try_get("user_id").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

#[derive(Clone)]
pub struct PgProposalStore {
    pool: PgPool,
}

impl PgProposalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_row(
        tx: &mut Transaction<'_, Postgres>,
        proposal: &Proposal,
    ) -> Result<(), StoreError> {
        let payment = proposal.payment.as_ref();
        sqlx::query(
            r#"
            UPDATE proposals SET
                client = $2,
                phone = $3,
                value = $4,
                category = $5,
                proposal_type = $6,
                description = $7,
                proposal_date = $8,
                status = $9,
                link_id = $10,
                link_expires_at = $11,
                payment_id = $12,
                payment_status = $13,
                payment_status_detail = $14,
                payment_date = $15,
                payment_updated_at = $16,
                version = $17,
                updated_at = $18
            WHERE id = $1
            "#,
        )
        .bind(&proposal.id)
        .bind(&proposal.client)
        .bind(&proposal.phone)
        .bind(proposal.value)
        .bind(proposal.category.as_str())
        .bind(proposal.proposal_type.as_str())
        .bind(&proposal.description)
        .bind(proposal.date)
        .bind(proposal.status.as_str())
        .bind(&proposal.link_id)
        .bind(proposal.link_expires_at)
        .bind(payment.map(|record| record.payment_id.clone()))
        .bind(payment.map(|record| record.payment_status.clone()))
        .bind(payment.and_then(|record| record.payment_status_detail.clone()))
        .bind(payment.map(|record| record.payment_date))
        .bind(payment.map(|record| record.payment_updated_at))
        .bind(proposal.version)
        .bind(proposal.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[async_trait]
impl ProposalStore for PgProposalStore {
    async fn insert(&self, proposal: Proposal) -> Result<Proposal, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO proposals (
                id, client, phone, value, category, proposal_type, description,
                proposal_date, status, user_id, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&proposal.id)
        .bind(&proposal.client)
        .bind(&proposal.phone)
        .bind(proposal.value)
        .bind(proposal.category.as_str())
        .bind(proposal.proposal_type.as_str())
        .bind(&proposal.description)
        .bind(proposal.date)
        .bind(proposal.status.as_str())
        .bind(&proposal.user_id)
        .bind(proposal.version)
        .bind(proposal.created_at)
        .bind(proposal.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(proposal)
    }

    async fn get(&self, id: &str) -> Result<Option<Proposal>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(proposal_from_row).transpose()
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Proposal>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(proposal_from_row).collect()
    }

    async fn update(
        &self,
        id: &str,
        expected_version: i64,
        patch: ProposalPatch,
    ) -> Result<Proposal, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut proposal = proposal_from_row(&row)?;
        if proposal.version != expected_version {
            return Err(StoreError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: proposal.version,
            });
        }

        patch.apply_to(&mut proposal);
        proposal.version += 1;
        Self::write_row(&mut tx, &proposal).await?;
        tx.commit().await.map_err(backend)?;

        Ok(proposal)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalLinkStore for PgLinkStore {
    async fn insert(&self, link: ProposalLink) -> Result<ProposalLink, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO proposal_links (
                id, proposal_id, status, created_at, updated_at, expires_at,
                payment_id, payment_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&link.id)
        .bind(&link.proposal_id)
        .bind(link.status.as_str())
        .bind(link.created_at)
        .bind(link.updated_at)
        .bind(link.expires_at)
        .bind(&link.payment_id)
        .bind(&link.payment_status)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(link)
    }

    async fn get(&self, id: &str) -> Result<Option<ProposalLink>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, proposal_id, status, created_at, updated_at, expires_at,
                   payment_id, payment_status
            FROM proposal_links
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn set_status(
        &self,
        id: &str,
        status: LinkStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE proposal_links SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .bind(updated_at)
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn record_payment(
        &self,
        id: &str,
        payment_id: &str,
        payment_status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE proposal_links
            SET status = $2, payment_id = $3, payment_status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(LinkStatus::Paid.as_str())
        .bind(payment_id)
        .bind(payment_status)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM proposal_links WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgReceivableStore {
    pool: PgPool,
}

impl PgReceivableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceivableStore for PgReceivableStore {
    async fn insert(&self, receivable: Receivable) -> Result<Receivable, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO receivables (
                id, proposal_id, client, value, due_date, status, user_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&receivable.id)
        .bind(&receivable.proposal_id)
        .bind(&receivable.client)
        .bind(receivable.value)
        .bind(receivable.due_date)
        .bind(receivable.status.as_str())
        .bind(&receivable.user_id)
        .bind(receivable.created_at)
        .bind(receivable.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(receivable)
    }

    async fn get(&self, id: &str) -> Result<Option<Receivable>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM receivables WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.as_ref().map(receivable_from_row).transpose()
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Receivable>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM receivables WHERE user_id = $1 ORDER BY due_date ASC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(receivable_from_row).collect()
    }

    async fn update(&self, id: &str, patch: ReceivablePatch) -> Result<Receivable, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            "SELECT {RECEIVABLE_COLUMNS} FROM receivables WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut receivable = receivable_from_row(&row)?;
        patch.apply_to(&mut receivable);

        sqlx::query(
            r#"
            UPDATE receivables
            SET client = $2, value = $3, due_date = $4, status = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(&receivable.id)
        .bind(&receivable.client)
        .bind(receivable.value)
        .bind(receivable.due_date)
        .bind(receivable.status.as_str())
        .bind(receivable.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;

        Ok(receivable)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM receivables WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
