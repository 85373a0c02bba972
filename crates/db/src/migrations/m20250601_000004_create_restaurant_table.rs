//! Create restaurant and restaurant_tag tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurant::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Restaurant::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Restaurant::Address).string_len(512).not_null())
                    .col(ColumnDef::new(Restaurant::Description).text().not_null())
                    .col(ColumnDef::new(Restaurant::Phone).string_len(32))
                    .col(ColumnDef::new(Restaurant::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(Restaurant::CategoryId).string_len(32))
                    .col(
                        ColumnDef::new(Restaurant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Restaurant::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_owner")
                            .from(Restaurant::Table, Restaurant::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_category")
                            .from(Restaurant::Table, Restaurant::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id (for listing a user's restaurants)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_owner_id")
                    .table(Restaurant::Table)
                    .col(Restaurant::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Index: category_id (for category filters)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_category_id")
                    .table(Restaurant::Table)
                    .col(Restaurant::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for feed ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_created_at")
                    .table(Restaurant::Table)
                    .col(Restaurant::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RestaurantTag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RestaurantTag::RestaurantId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RestaurantTag::TagId).string_len(32).not_null())
                    .primary_key(
                        Index::create()
                            .col(RestaurantTag::RestaurantId)
                            .col(RestaurantTag::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_tag_restaurant")
                            .from(RestaurantTag::Table, RestaurantTag::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_tag_tag")
                            .from(RestaurantTag::Table, RestaurantTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RestaurantTag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Restaurant {
    Table,
    Id,
    OwnerId,
    Name,
    Address,
    Description,
    Phone,
    ImageUrl,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum RestaurantTag {
    Table,
    RestaurantId,
    TagId,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
}
