use crate::models::{ListingInsert, ListingRow};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};

/// 分配菜单号时使用的事务级 advisory lock
const MENU_NUM_LOCK_KEY: i64 = 0x5741_5354;

/// 查询菜单行 (汇总用), menu_num 与时间区间均为可选条件
pub async fn list_menu_records(
    pool: &PgPool,
    menu_num: Option<i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, item, qty, taken, wasted, meal_period, day,
               menu_num, menu_name, created_at, extra
        FROM listings
        WHERE menu_num IS NOT NULL
          AND ($1::BIGINT IS NULL OR menu_num = $1)
          AND ($2::TIMESTAMPTZ IS NULL OR created_at >= $2)
          AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
        ORDER BY id
        "#,
    )
    .bind(menu_num)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// 查询全部行 (包括扫描记录)
pub async fn list_listings(pool: &PgPool) -> Result<Vec<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, item, qty, taken, wasted, meal_period, day,
               menu_num, menu_name, created_at, extra
        FROM listings
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// 按菜品名查询
pub async fn list_listings_by_item(
    pool: &PgPool,
    item: &str,
) -> Result<Vec<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, item, qty, taken, wasted, meal_period, day,
               menu_num, menu_name, created_at, extra
        FROM listings
        WHERE item = $1
        ORDER BY id
        "#,
    )
    .bind(item)
    .fetch_all(pool)
    .await
}

/// 统计某菜品出现次数 (旧版 ratio 计算用)
pub async fn count_by_item(pool: &PgPool, item: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM listings WHERE item = $1")
        .bind(item)
        .fetch_one(pool)
        .await
}

/// 插入单行, 返回 id
pub async fn insert_listing(pool: &PgPool, row: &ListingInsert) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO listings (
            item, qty, taken, wasted, meal_period, day,
            menu_num, menu_name, created_at, extra
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&row.item)
    .bind(row.qty)
    .bind(row.taken)
    .bind(row.wasted)
    .bind(row.meal_period)
    .bind(row.day)
    .bind(row.menu_num)
    .bind(&row.menu_name)
    .bind(row.created_at)
    .bind(Json(&row.extra))
    .fetch_one(pool)
    .await
}

/// 批量插入, 返回插入后的行
pub async fn insert_rows(
    conn: &mut PgConnection,
    rows: &[ListingInsert],
) -> Result<Vec<ListingRow>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO listings (
            item, qty, taken, wasted, meal_period, day,
            menu_num, menu_name, created_at, extra
        ) ",
    );

    query_builder.push_values(rows, |mut b, row| {
        b.push_bind(row.item.clone())
            .push_bind(row.qty)
            .push_bind(row.taken)
            .push_bind(row.wasted)
            .push_bind(row.meal_period)
            .push_bind(row.day)
            .push_bind(row.menu_num)
            .push_bind(row.menu_name.clone())
            .push_bind(row.created_at)
            .push_bind(Json(row.extra.clone()));
    });
    query_builder.push(
        " RETURNING id, item, qty, taken, wasted, meal_period, day,
                    menu_num, menu_name, created_at, extra",
    );

    let inserted = query_builder
        .build_query_as::<ListingRow>()
        .fetch_all(&mut *conn)
        .await?;

    tracing::debug!("Inserted {} listing rows", inserted.len());
    Ok(inserted)
}

/// wasted + 1
pub async fn increment_wasted(pool: &PgPool, id: i64) -> Result<Option<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        UPDATE listings
        SET wasted = COALESCE(wasted, 0) + 1
        WHERE id = $1
        RETURNING id, item, qty, taken, wasted, meal_period, day,
                  menu_num, menu_name, created_at, extra
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 按菜品名给最近一行 wasted + 1 (摄像头识别事件)
pub async fn increment_wasted_latest(
    pool: &PgPool,
    item: &str,
) -> Result<Option<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        UPDATE listings
        SET wasted = COALESCE(wasted, 0) + 1
        WHERE id = (
            SELECT id FROM listings
            WHERE item = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        )
        RETURNING id, item, qty, taken, wasted, meal_period, day,
                  menu_num, menu_name, created_at, extra
        "#,
    )
    .bind(item)
    .fetch_optional(pool)
    .await
}

/// 查询菜单行; menu_num 为 None 时返回所有菜单的行
pub async fn list_menu_rows(
    pool: &PgPool,
    menu_num: Option<i64>,
) -> Result<Vec<ListingRow>, sqlx::Error> {
    sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, item, qty, taken, wasted, meal_period, day,
               menu_num, menu_name, created_at, extra
        FROM listings
        WHERE menu_num IS NOT NULL
          AND ($1::BIGINT IS NULL OR menu_num = $1)
        ORDER BY menu_num, id
        "#,
    )
    .bind(menu_num)
    .fetch_all(pool)
    .await
}

/// 在事务内分配下一个菜单号 (max + 1)
pub async fn next_menu_num(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MENU_NUM_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(menu_num), 0) + 1 FROM listings WHERE menu_num IS NOT NULL",
    )
    .fetch_one(&mut *conn)
    .await
}

/// 菜单的原始创建时间 (取最早插入的一行)
pub async fn menu_created_at(
    conn: &mut PgConnection,
    menu_num: i64,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "SELECT created_at FROM listings WHERE menu_num = $1 ORDER BY id LIMIT 1",
    )
    .bind(menu_num)
    .fetch_optional(&mut *conn)
    .await
}

/// 删除菜单的所有行, 返回删除行数
pub async fn delete_menu_rows<'e, E>(executor: E, menu_num: i64) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM listings WHERE menu_num = $1")
        .bind(menu_num)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
