//! Tag Resolver - タグ名を TagId に解決し、足りないものを作る
//!
//! # 手順
//! 1. 要求された名前を重複排除する
//! 2. ユーザーの既存タグを 1 クエリで引く
//! 3. 無いものを 1 回のバッチ INSERT で作る
//!
//! `UNIQUE(user_id, name)` と `ON CONFLICT DO NOTHING` により、
//! 同じ名前を同時に作ろうとした書き込みは 1 行に収束します。
//! 競合で RETURNING に出てこなかった名前は最後に引き直します。
//! ストア経由の呼び出しは `BEGIN IMMEDIATE` の中なので、この引き直しが効くのは
//! 書き込みトランザクションの外から呼ばれた場合だけです。

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows::encode_time;
use crate::domain::errors::StorageContext;
use crate::domain::{ErrorKind, StorageError, Tag, TagId, UserId};

pub(crate) async fn resolve_tags<'a>(
    conn: &mut SqliteConnection,
    user: UserId,
    names: impl IntoIterator<Item = &'a Tag>,
    now: DateTime<Utc>,
) -> Result<BTreeMap<Tag, TagId>, StorageError> {
    let wanted: BTreeSet<&Tag> = names.into_iter().collect();
    if wanted.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut resolved = select_existing(conn, user, wanted.iter().copied()).await?;

    let missing: Vec<&Tag> = wanted
        .iter()
        .copied()
        .filter(|tag| !resolved.contains_key(*tag))
        .collect();
    if missing.is_empty() {
        return Ok(resolved);
    }

    let created = insert_missing(conn, user, &missing, now).await?;
    tracing::debug!(%user, created = created.len(), "created tags");
    resolved.extend(created);

    // 他の書き込みが先に作った分
    let raced: Vec<&Tag> = missing
        .into_iter()
        .filter(|tag| !resolved.contains_key(*tag))
        .collect();
    if !raced.is_empty() {
        resolved.extend(select_existing(conn, user, raced.iter().copied()).await?);
    }

    if let Some(tag) = wanted.iter().find(|tag| !resolved.contains_key(**tag)) {
        return Err(StorageError::new(
            ErrorKind::Structural,
            "resolving tags",
            format!("tag {tag:?} was neither found nor created"),
        ));
    }
    Ok(resolved)
}

async fn select_existing<'a>(
    conn: &mut SqliteConnection,
    user: UserId,
    names: impl Iterator<Item = &'a Tag>,
) -> Result<BTreeMap<Tag, TagId>, StorageError> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT tag_id, name FROM tags WHERE user_id = ");
    qb.push_bind(user.get());
    qb.push(" AND name IN (");
    let mut separated = qb.separated(", ");
    for name in names {
        separated.push_bind(name.as_str().to_owned());
    }
    separated.push_unseparated(")");

    let rows: Vec<(i64, String)> = qb
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .storage_context("selecting tags")?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| (Tag::new(name), TagId::new(id)))
        .collect())
}

async fn insert_missing(
    conn: &mut SqliteConnection,
    user: UserId,
    missing: &[&Tag],
    now: DateTime<Utc>,
) -> Result<BTreeMap<Tag, TagId>, StorageError> {
    let created_at = encode_time(now);

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO tags (user_id, name, created_at) ");
    qb.push_values(missing.iter(), |mut b, tag| {
        b.push_bind(user.get())
            .push_bind(tag.as_str().to_owned())
            .push_bind(created_at.clone());
    });
    qb.push(" ON CONFLICT (user_id, name) DO NOTHING RETURNING tag_id, name");

    let rows: Vec<(i64, String)> = qb
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .storage_context("inserting tags")?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| (Tag::new(name), TagId::new(id)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::sqlite::schema::provision;
    use chrono::TimeZone;
    use sqlx::Connection;

    async fn memory_db() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        provision(&mut conn).await.unwrap();
        conn
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    async fn tag_count(conn: &mut SqliteConnection) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn duplicate_names_create_one_row() {
        let mut conn = memory_db().await;
        let user = UserId::new(1);
        let urgent = Tag::new("urgent");

        let map = resolve_tags(&mut conn, user, [&urgent, &urgent], now())
            .await
            .unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(tag_count(&mut conn).await, 1);
    }

    #[tokio::test]
    async fn existing_tags_are_reused() {
        let mut conn = memory_db().await;
        let user = UserId::new(1);
        let (work, home) = (Tag::new("work"), Tag::new("home"));

        let first = resolve_tags(&mut conn, user, [&work], now()).await.unwrap();
        let second = resolve_tags(&mut conn, user, [&work, &home], now())
            .await
            .unwrap();

        assert_eq!(first[&work], second[&work]);
        assert_ne!(second[&work], second[&home]);
        assert_eq!(tag_count(&mut conn).await, 2);
    }

    #[tokio::test]
    async fn users_own_their_tags_independently() {
        let mut conn = memory_db().await;
        let work = Tag::new("work");

        let a = resolve_tags(&mut conn, UserId::new(1), [&work], now())
            .await
            .unwrap();
        let b = resolve_tags(&mut conn, UserId::new(2), [&work], now())
            .await
            .unwrap();

        assert_ne!(a[&work], b[&work]);
    }

    #[tokio::test]
    async fn names_are_case_sensitive() {
        let mut conn = memory_db().await;
        let (lower, upper) = (Tag::new("work"), Tag::new("Work"));

        let map = resolve_tags(&mut conn, UserId::new(1), [&lower, &upper], now())
            .await
            .unwrap();

        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn nothing_requested_touches_nothing() {
        let mut conn = memory_db().await;
        let map = resolve_tags(&mut conn, UserId::new(1), std::iter::empty(), now())
            .await
            .unwrap();
        assert!(map.is_empty());
        assert_eq!(tag_count(&mut conn).await, 0);
    }

    #[tokio::test]
    async fn name_created_between_select_and_insert_is_picked_up() {
        let mut conn = memory_db().await;
        // 別の書き込みが先に同じ名前を作った状況を再現する
        sqlx::query(
            "CREATE TRIGGER concurrent_writer BEFORE INSERT ON tags
             WHEN NEW.name = 'shared'
             BEGIN
                 INSERT OR IGNORE INTO tags (user_id, name, created_at)
                 VALUES (NEW.user_id, NEW.name, NEW.created_at);
             END",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        let (shared, own) = (Tag::new("shared"), Tag::new("own"));
        let map = resolve_tags(&mut conn, UserId::new(1), [&shared, &own], now())
            .await
            .unwrap();

        let (winner,): (i64,) =
            sqlx::query_as("SELECT tag_id FROM tags WHERE user_id = 1 AND name = 'shared'")
                .fetch_one(&mut conn)
                .await
                .unwrap();
        assert_eq!(map[&shared], TagId::new(winner));
        assert!(map.contains_key(&own));
        assert_eq!(tag_count(&mut conn).await, 2);
    }

    #[tokio::test]
    async fn vanished_tag_is_structural() {
        let mut conn = memory_db().await;
        sqlx::query(
            "CREATE TRIGGER swallow BEFORE INSERT ON tags
             WHEN NEW.name = 'ghost'
             BEGIN SELECT RAISE(IGNORE); END",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        let ghost = Tag::new("ghost");
        let err = resolve_tags(&mut conn, UserId::new(1), [&ghost], now())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(err.context(), "resolving tags");
    }
}
