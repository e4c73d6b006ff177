use chrono::{DateTime, Utc};
use postyt_core::{AccountCredential, AccountSummary, AppError, EncryptionService, PlatformId};
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Linked account database model
///
/// Token columns hold `EncryptionService` ciphertext, never plaintext.
#[derive(Clone, FromRow)]
pub struct LinkedAccountRow {
    pub id: Uuid,
    pub user_id: String,
    pub platform: String,
    pub account_id: String,
    pub account_name: String,
    pub access_token_encrypted: String,
    pub refresh_token_encrypted: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LinkedAccountSummaryRow {
    pub platform: String,
    pub account_id: String,
    pub account_name: String,
}

impl LinkedAccountSummaryRow {
    /// Rows whose platform column no longer parses are skipped by callers
    pub fn platform(&self) -> Option<PlatformId> {
        self.platform.parse().ok()
    }

    pub fn into_summary(self) -> AccountSummary {
        AccountSummary {
            account_id: self.account_id,
            account_name: self.account_name,
        }
    }
}

#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
    encryption: EncryptionService,
}

impl AccountRepository {
    pub fn new(pool: PgPool, encryption: EncryptionService) -> Self {
        Self { pool, encryption }
    }

    fn decrypt_row(&self, row: LinkedAccountRow) -> Result<AccountCredential, AppError> {
        Ok(AccountCredential {
            access_token: self.encryption.decrypt(&row.access_token_encrypted)?,
            refresh_token: self
                .encryption
                .decrypt_optional(row.refresh_token_encrypted.as_deref())?,
            account_id: row.account_id,
            account_name: row.account_name,
            expiry_date: row.expiry_date,
        })
    }

    /// Get one linked account with decrypted tokens
    #[tracing::instrument(skip(self), fields(db.table = "linked_accounts", db.operation = "select"))]
    pub async fn find_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        account_id: &str,
    ) -> Result<Option<AccountCredential>, AppError> {
        let row = sqlx::query_as::<Postgres, LinkedAccountRow>(
            r#"
            SELECT * FROM linked_accounts
            WHERE user_id = $1 AND platform = $2 AND account_id = $3
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get linked account");
            AppError::Database(e)
        })?;

        row.map(|row| self.decrypt_row(row)).transpose()
    }

    /// List the accounts a user has linked, oldest first, without tokens
    #[tracing::instrument(skip(self), fields(db.table = "linked_accounts", db.operation = "select"))]
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<LinkedAccountSummaryRow>, AppError> {
        let rows = sqlx::query_as::<Postgres, LinkedAccountSummaryRow>(
            r#"
            SELECT platform, account_id, account_name FROM linked_accounts
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list linked accounts");
            AppError::Database(e)
        })?;

        Ok(rows)
    }

    /// Insert or re-link an account
    ///
    /// A re-authorization that comes back without a refresh token keeps the stored one.
    #[tracing::instrument(skip(self, credential), fields(db.table = "linked_accounts", db.operation = "upsert", account_id = %credential.account_id))]
    pub async fn upsert(
        &self,
        user_id: &str,
        platform: PlatformId,
        credential: &AccountCredential,
    ) -> Result<(), AppError> {
        let access_token = self.encryption.encrypt(&credential.access_token)?;
        let refresh_token = self
            .encryption
            .encrypt_optional(credential.refresh_token.as_deref())?;

        sqlx::query(
            r#"
            INSERT INTO linked_accounts (
                user_id, platform, account_id, account_name,
                access_token_encrypted, refresh_token_encrypted, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, platform, account_id) DO UPDATE SET
                account_name = EXCLUDED.account_name,
                access_token_encrypted = EXCLUDED.access_token_encrypted,
                refresh_token_encrypted = COALESCE(
                    EXCLUDED.refresh_token_encrypted,
                    linked_accounts.refresh_token_encrypted
                ),
                expiry_date = EXCLUDED.expiry_date,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(&credential.account_id)
        .bind(&credential.account_name)
        .bind(&access_token)
        .bind(&refresh_token)
        .bind(credential.expiry_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to upsert linked account");
            AppError::Database(e)
        })?;

        tracing::info!(
            user_id = %user_id,
            platform = %platform,
            account_id = %credential.account_id,
            "Linked account saved"
        );

        Ok(())
    }

    /// Store a refreshed token pair; returns whether a row was updated
    #[tracing::instrument(skip(self, access_token, refresh_token), fields(db.table = "linked_accounts", db.operation = "update"))]
    pub async fn update_tokens(
        &self,
        user_id: &str,
        platform: PlatformId,
        account_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let access_token = self.encryption.encrypt(access_token)?;
        let refresh_token = self.encryption.encrypt_optional(refresh_token)?;

        let result = sqlx::query(
            r#"
            UPDATE linked_accounts
            SET access_token_encrypted = $4,
                refresh_token_encrypted = COALESCE($5, refresh_token_encrypted),
                expiry_date = $6,
                updated_at = NOW()
            WHERE user_id = $1 AND platform = $2 AND account_id = $3
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .bind(account_id)
        .bind(&access_token)
        .bind(&refresh_token)
        .bind(expiry_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to update account tokens");
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}
