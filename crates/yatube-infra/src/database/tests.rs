use std::collections::BTreeMap;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use crate::database::entity::{group, post};
use crate::database::postgres_repo::{
    PostgresFollowRepository, PostgresGroupRepository, PostgresPostRepository,
};
use yatube_core::FeedFilter;
use yatube_core::domain::Post;
use yatube_core::error::RepoError;
use yatube_core::ports::{BaseRepository, FollowRepository, GroupRepository, PostRepository};

fn post_model(author_id: Uuid, text: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        text: text.to_owned(),
        pub_date: chrono::Utc::now().into(),
        author_id,
        group_id: None,
        image: None,
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let author_id = Uuid::new_v4();
    let model = post_model(author_id, "Тестовый пост");
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let found: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = found.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
    assert_eq!(post.text, "Тестовый пост");
}

#[tokio::test]
async fn test_count_feed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(13)]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let count = repo.count_feed(&FeedFilter::All).await.unwrap();
    assert_eq!(count, 13);
}

#[tokio::test]
async fn test_fetch_feed_orders_and_limits() {
    let author_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            post_model(author_id, "newer"),
            post_model(author_id, "older"),
        ]])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let posts = repo
        .fetch_feed(&FeedFilter::Author(author_id), 10, 10)
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].text, "newer");

    let sql = format!("{:?}", db.into_transaction_log()[0]);
    assert!(sql.contains("ORDER BY"));
    assert!(sql.contains("pub_date"));
    assert!(sql.contains("DESC"));
    assert!(sql.contains("LIMIT"));
}

#[tokio::test]
async fn test_follow_feed_uses_subquery() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let posts = repo
        .fetch_feed(&FeedFilter::FollowedBy(Uuid::new_v4()), 0, 10)
        .await
        .unwrap();
    assert!(posts.is_empty());

    let sql = format!("{:?}", db.into_transaction_log()[0]);
    assert!(sql.contains("follows"));
}

#[tokio::test]
async fn test_find_group_by_slug() {
    let group_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group::Model {
            id: group_id,
            title: "Тестовая группа".to_owned(),
            slug: "test-slug".to_owned(),
            description: "Тестовое описание".to_owned(),
        }]])
        .append_query_results([Vec::<group::Model>::new()])
        .into_connection();
    let repo = PostgresGroupRepository::new(db);

    let group = repo.find_by_slug("test-slug").await.unwrap().unwrap();
    assert_eq!(group.id, group_id);

    assert!(repo.find_by_slug("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_pair_reports_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();
    let repo = PostgresFollowRepository::new(db);
    let (user, author) = (Uuid::new_v4(), Uuid::new_v4());

    assert_eq!(repo.delete_pair(user, author).await.unwrap(), 1);
    assert_eq!(repo.delete_pair(user, author).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let err = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}
