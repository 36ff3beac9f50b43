//! Database module
//!
//! Database connection and schema verification utilities.
//! Migrations are raw SQL files in the migrations/ directory.

use sqlx::PgPool;

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = vec!["bank", "accounts", "addresses", "transactions", "transfers"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    // The bank-wide state is a seeded single row
    let bank_seeded: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bank)")
        .fetch_one(pool)
        .await?;

    if !bank_seeded {
        tracing::error!("Bank state row is missing. Please run database seed.");
        return Ok(false);
    }

    Ok(true)
}
