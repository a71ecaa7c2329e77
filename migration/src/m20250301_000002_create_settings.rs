use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 站点设置表 ====================
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::Value).text().not_null())
                    .col(ColumnDef::new(Settings::ValueType).string().not_null())
                    .col(ColumnDef::new(Settings::Description).text().null())
                    .col(ColumnDef::new(Settings::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Settings::UpdatedBy).big_integer().null())
                    .to_owned(),
            )
            .await?;

        // ==================== 插入默认配置 ====================
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let default_settings = [
            ("site.name", "Kelas", "string", "Nama situs"),
            (
                "site.tagline",
                "Belajar bersama mentor terbaik",
                "string",
                "Tagline halaman depan",
            ),
            ("contact.email", "halo@kelas.id", "string", "Email kontak"),
            ("contact.phone", "+62 812 0000 0000", "string", "Nomor telepon"),
            ("contact.address", "Jakarta, Indonesia", "string", "Alamat"),
            (
                "upload.max_size",
                "52428800",
                "integer",
                "Ukuran maksimum berkas (byte)",
            ),
            (
                "upload.allowed_types",
                r#"[".pdf",".doc",".docx",".ppt",".pptx",".txt",".zip",".jpg",".jpeg",".png",".gif",".webp",".mp4"]"#,
                "json_array",
                "Ekstensi berkas yang diizinkan",
            ),
        ];

        for (key, value, value_type, description) in default_settings {
            let insert = Query::insert()
                .into_table(Settings::Table)
                .columns([
                    Settings::Key,
                    Settings::Value,
                    Settings::ValueType,
                    Settings::Description,
                    Settings::UpdatedAt,
                ])
                .values_panic([
                    key.into(),
                    value.into(),
                    value_type.into(),
                    description.into(),
                    now.into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Settings {
    #[sea_orm(iden = "settings")]
    Table,
    Key,
    Value,
    ValueType,
    Description,
    UpdatedAt,
    UpdatedBy,
}
