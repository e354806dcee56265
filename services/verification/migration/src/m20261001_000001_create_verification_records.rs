use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// At most one unconsumed code per email. sea-query has no portable partial
/// index builder, so this one is raw Postgres.
const ACTIVE_EMAIL_UNIQUE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
    uq_verification_records_active_email \
    ON verification_records (email) WHERE verified = false";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VerificationRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationRecords::Email).string().not_null())
                    .col(
                        ColumnDef::new(VerificationRecords::Code)
                            .string_len(6)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationRecords::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VerificationRecords::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VerificationRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups by email (verify, recent check, invalidation).
        manager
            .create_index(
                Index::create()
                    .table(VerificationRecords::Table)
                    .col(VerificationRecords::Email)
                    .col(VerificationRecords::CreatedAt)
                    .name("idx_verification_records_email_created_at")
                    .to_owned(),
            )
            .await?;

        // Retention sweep.
        manager
            .create_index(
                Index::create()
                    .table(VerificationRecords::Table)
                    .col(VerificationRecords::CreatedAt)
                    .name("idx_verification_records_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(ACTIVE_EMAIL_UNIQUE)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum VerificationRecords {
    Table,
    Id,
    Email,
    Code,
    Verified,
    Attempts,
    CreatedAt,
    ExpiresAt,
}
