use sqlx::PgPool;

/// 建表语句, 逐条执行 (均可重复执行)
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id          BIGSERIAL PRIMARY KEY,
        item        TEXT NOT NULL,
        qty         BIGINT,
        taken       BIGINT,
        wasted      BIGINT,
        meal_period INTEGER,
        day         INTEGER,
        menu_num    BIGINT,
        menu_name   TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        extra       JSONB NOT NULL DEFAULT '{}'::jsonb
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_listings_menu_num ON listings (menu_num) WHERE menu_num IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS idx_listings_item ON listings (item)",
    "CREATE INDEX IF NOT EXISTS idx_listings_created_at ON listings (created_at)",
];

/// 启动时确保表结构存在
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::info!("Schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
