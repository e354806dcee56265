use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use registry_verification_schema::{outbox_events, verification_records};

use crate::domain::repository::VerificationRepository;
use crate::domain::types::{OutboxEvent, VerificationRecord};
use crate::error::VerificationServiceError;

use verification_records::Column;

#[derive(Clone)]
pub struct DbVerificationRepository {
    pub db: Arc<DatabaseConnection>,
}

impl VerificationRepository for DbVerificationRepository {
    async fn replace_active(
        &self,
        record: &VerificationRecord,
        event: &OutboxEvent,
    ) -> Result<u64, VerificationServiceError> {
        let invalidated = self
            .db
            .transaction::<_, u64, sea_orm::DbErr>(|txn| {
                let record = record.clone();
                let event = event.clone();
                Box::pin(async move {
                    let invalidated = invalidate_active(txn, &record.email).await?;
                    insert_record(txn, &record).await?;
                    insert_outbox_event(txn, &event, record.created_at).await?;
                    Ok(invalidated)
                })
            })
            .await
            .context("replace active verification code")?;
        Ok(invalidated)
    }

    async fn find_latest_active(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationRecord>, VerificationServiceError> {
        let model = verification_records::Entity::find()
            .filter(Column::Email.eq(email))
            .filter(Column::Code.eq(code))
            .filter(Column::Verified.eq(false))
            .order_by_desc(Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .context("find active verification record")?;
        Ok(model.map(record_from_model))
    }

    async fn consume(
        &self,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<bool, VerificationServiceError> {
        let result = verification_records::Entity::update_many()
            .col_expr(Column::Verified, Expr::value(true))
            .col_expr(Column::Attempts, Expr::col(Column::Attempts).add(1))
            .filter(Column::Id.eq(id))
            .filter(Column::Verified.eq(false))
            .filter(Column::Attempts.lt(max_attempts))
            .exec(self.db.as_ref())
            .await
            .context("consume verification record")?;
        Ok(result.rows_affected == 1)
    }

    async fn exists_verified_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, VerificationServiceError> {
        let model = verification_records::Entity::find()
            .filter(Column::Email.eq(email))
            .filter(Column::Verified.eq(true))
            .filter(Column::CreatedAt.gte(since))
            .one(self.db.as_ref())
            .await
            .context("find recent verified record")?;
        Ok(model.is_some())
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, VerificationServiceError> {
        let result = verification_records::Entity::delete_many()
            .filter(Column::CreatedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .context("delete old verification records")?;
        Ok(result.rows_affected)
    }
}

async fn invalidate_active(txn: &DatabaseTransaction, email: &str) -> Result<u64, sea_orm::DbErr> {
    let result = verification_records::Entity::update_many()
        .col_expr(Column::Verified, Expr::value(true))
        .filter(Column::Email.eq(email))
        .filter(Column::Verified.eq(false))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}

async fn insert_record(
    txn: &DatabaseTransaction,
    record: &VerificationRecord,
) -> Result<(), sea_orm::DbErr> {
    verification_records::ActiveModel {
        id: Set(record.id),
        email: Set(record.email.clone()),
        code: Set(record.code.clone()),
        verified: Set(record.verified),
        attempts: Set(record.attempts),
        created_at: Set(record.created_at),
        expires_at: Set(record.expires_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
    now: DateTime<Utc>,
) -> Result<(), sea_orm::DbErr> {
    outbox_events::ActiveModel {
        id: Set(event.id),
        aggregate_id: Set(event.aggregate_id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn record_from_model(model: verification_records::Model) -> VerificationRecord {
    VerificationRecord {
        id: model.id,
        email: model.email,
        code: model.code,
        verified: model.verified,
        attempts: model.attempts,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}
