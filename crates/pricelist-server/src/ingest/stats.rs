//! Table-wide aggregates

use sqlx::PgExecutor;

use super::models::TableStats;

const STATS_SQL: &str = r#"
    SELECT
        (SELECT COUNT(*) FROM prices) AS total_items,
        (SELECT COUNT(DISTINCT category) FROM prices) AS total_categories,
        (SELECT COALESCE(SUM(price), 0) FROM prices) AS total_price,
        (
            SELECT COALESCE(SUM(group_size - 1), 0)::BIGINT
            FROM (
                SELECT COUNT(*) AS group_size
                FROM prices
                GROUP BY name, category, price, create_date
                HAVING COUNT(*) > 1
            ) AS identity_groups
        ) AS duplicates_count
"#;

/// Compute aggregates over the whole `prices` table
///
/// Takes any executor so it can run inside the ingest transaction or straight on the pool.
pub async fn collect<'e, E>(executor: E) -> Result<TableStats, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TableStats>(STATS_SQL)
        .fetch_one(executor)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use sqlx::PgPool;
    use std::str::FromStr;

    async fn insert(pool: &PgPool, name: &str, category: &str, price: &str) {
        sqlx::query(
            "INSERT INTO prices (name, category, price, create_date) VALUES ($1, $2, $3::numeric, '2024-01-01')",
        )
        .bind(name)
        .bind(category)
        .bind(price)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_empty_table(pool: PgPool) {
        let stats = collect(&pool).await.unwrap();
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.total_categories, 0);
        assert_eq!(stats.total_price, BigDecimal::from(0));
        assert_eq!(stats.duplicates_count, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_counts_and_duplicate_groups(pool: PgPool) {
        insert(&pool, "apple", "a", "10.00").await;
        insert(&pool, "apple", "a", "10.00").await;
        insert(&pool, "apple", "a", "10.00").await;
        insert(&pool, "pear", "a", "20.00").await;
        insert(&pool, "plum", "b", "0.50").await;

        let stats = collect(&pool).await.unwrap();
        assert_eq!(stats.total_items, 5);
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_price, BigDecimal::from_str("50.50").unwrap());
        assert_eq!(stats.duplicates_count, 2);
    }
}
