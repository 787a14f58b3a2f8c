#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::credentials::{StoredCard, StoredCredentials, assemble};
use sqlx::SqlitePool;
use warden_core::{AdminPassword, CardUid, CredentialConfig, Pin};

/// Repository trait for the persisted credential configuration
pub trait CredentialRepository: Send + Sync {
    /// Load the stored configuration, `None` on a fresh database
    async fn load(&self) -> StorageResult<Option<CredentialConfig>>;

    /// Overwrite everything with `config` in one transaction
    async fn replace_all(&self, config: &CredentialConfig) -> StorageResult<()>;

    async fn save_door_pin(&self, pin: &Pin) -> StorageResult<()>;

    async fn save_admin_password(&self, password: &AdminPassword) -> StorageResult<()>;

    async fn insert_card(&self, slot: usize, uid: CardUid) -> StorageResult<()>;

    /// Delete every slot holding `uid`, returning the number removed
    async fn delete_card(&self, uid: CardUid) -> StorageResult<u64>;
}

/// SQLite implementation of CredentialRepository
#[derive(Debug, Clone)]
pub struct SqliteCredentialRepository {
    pool: SqlitePool,
}

impl SqliteCredentialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn missing_row() -> StorageError {
        StorageError::NotFound {
            entity_type: "credentials".to_string(),
            field: "id".to_string(),
            value: "1".to_string(),
        }
    }
}

impl CredentialRepository for SqliteCredentialRepository {
    async fn load(&self) -> StorageResult<Option<CredentialConfig>> {
        let secrets = sqlx::query_as::<_, StoredCredentials>(
            r#"
            SELECT door_pin, admin_password
            FROM credentials
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(secrets) = secrets else {
            return Ok(None);
        };

        let cards = sqlx::query_as::<_, StoredCard>(
            r#"
            SELECT slot, uid
            FROM authorized_cards
            ORDER BY slot
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        assemble(secrets, &cards).map(Some)
    }

    async fn replace_all(&self, config: &CredentialConfig) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO credentials (id, door_pin, admin_password)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                door_pin = excluded.door_pin,
                admin_password = excluded.admin_password,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(config.door_pin().expose())
        .bind(config.admin_password().expose())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM authorized_cards")
            .execute(&mut *tx)
            .await?;

        for (slot, uid) in config.cards() {
            let row = StoredCard::new(slot, uid);
            sqlx::query("INSERT INTO authorized_cards (slot, uid) VALUES (?, ?)")
                .bind(row.slot)
                .bind(row.uid)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_door_pin(&self, pin: &Pin) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET door_pin = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            "#,
        )
        .bind(pin.expose())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::missing_row());
        }
        Ok(())
    }

    async fn save_admin_password(&self, password: &AdminPassword) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET admin_password = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = 1
            "#,
        )
        .bind(password.expose())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::missing_row());
        }
        Ok(())
    }

    async fn insert_card(&self, slot: usize, uid: CardUid) -> StorageResult<()> {
        let row = StoredCard::new(slot, uid);
        sqlx::query(
            r#"
            INSERT INTO authorized_cards (slot, uid)
            VALUES (?, ?)
            ON CONFLICT(slot) DO UPDATE SET uid = excluded.uid, added_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(row.slot)
        .bind(row.uid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_card(&self, uid: CardUid) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM authorized_cards WHERE uid = ?")
            .bind(i64::from(uid.as_u32()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
