//! Create complaint and complaint assignment tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Complaint::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Complaint::FilerId).string_len(32).not_null())
                    .col(ColumnDef::new(Complaint::DepartmentId).string_len(32))
                    .col(ColumnDef::new(Complaint::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Complaint::Body).text().not_null())
                    .col(ColumnDef::new(Complaint::Location).string_len(256))
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(16)
                            .not_null()
                            .default("filed"),
                    )
                    .col(
                        ColumnDef::new(Complaint::ProgressReport)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Complaint::WasTravelled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Complaint::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Complaint::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_filer")
                            .from(Complaint::Table, Complaint::FilerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_department")
                            .from(Complaint::Table, Complaint::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: filer_id (for a citizen's own complaints)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_filer_id")
                    .table(Complaint::Table)
                    .col(Complaint::FilerId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) (for dashboard listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status_created_at")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComplaintAssignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintAssignment::ComplaintId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::OfficialId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(ComplaintAssignment::ComplaintId)
                            .col(ComplaintAssignment::OfficialId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_assignment_complaint")
                            .from(ComplaintAssignment::Table, ComplaintAssignment::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_assignment_official")
                            .from(ComplaintAssignment::Table, ComplaintAssignment::OfficialId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: official_id (for an official's triage queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assignment_official_id")
                    .table(ComplaintAssignment::Table)
                    .col(ComplaintAssignment::OfficialId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintAssignment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    Token,
    FilerId,
    DepartmentId,
    Title,
    Body,
    Location,
    Status,
    ProgressReport,
    WasTravelled,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ComplaintAssignment {
    Table,
    ComplaintId,
    OfficialId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Department {
    Table,
    Id,
}
