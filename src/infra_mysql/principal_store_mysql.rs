use crate::application_port::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Read-only view of the `auth_credential` table. Rows are written by the
/// account collaborators.
pub struct MySqlPrincipalStore {
    pool: MySqlPool,
}

impl MySqlPrincipalStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPrincipalStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<PrincipalRecord, AuthError> {
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(PrincipalRecord {
            username,
            password_hash,
            is_active,
        })
    }
}

#[async_trait::async_trait]
impl PrincipalStore for MySqlPrincipalStore {
    async fn find_principal(&self, username: &str) -> Result<Option<PrincipalRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT username, password_hash, is_active
FROM auth_credential
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
