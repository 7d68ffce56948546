mod common;

use std::sync::Arc;

use blog_db::{ArticlesGateway, CommentsGateway, Gateway, Row};

use common::{blog_database, exec};

fn article() -> Row {
    Row::new()
        .with("id", 5)
        .with("author", "Jimmy Doe")
        .with("title", "Fifth blog post")
        .with("text", "Lorem ipsum...")
}

fn gateways() -> (ArticlesGateway, CommentsGateway) {
    let db = blog_database();
    (ArticlesGateway::new(Arc::clone(&db)), CommentsGateway::new(db))
}

#[test]
fn table_configuration() {
    let (articles, _) = gateways();
    assert_eq!(articles.table().name, "Articles");
    assert_eq!(articles.table().primary, "id");
    assert_eq!(articles.find_all().to_string(), r#"SELECT * FROM "Articles""#);
    assert_eq!(articles.find_all().count().unwrap(), 4);
}

#[test]
fn fetch_by_key_and_column() {
    let (articles, _) = gateways();
    assert_eq!(articles.fetch(1).unwrap().unwrap().get_str("author"), Some("John Doe"));
    assert_eq!(articles.fetch("1").unwrap().unwrap().get_str("author"), Some("John Doe"));
    assert_eq!(articles.fetch_where("author", "Jack Doe").unwrap().unwrap().get_i64("id"), Some(3));
    assert_eq!(articles.fetch_all().unwrap().len(), 4);
}

#[test]
fn article_exists() {
    let (articles, _) = gateways();
    assert!(articles.article_exists(1).unwrap());
    assert!(articles.article_exists(2).unwrap());
    assert!(!articles.article_exists(7).unwrap());
}

#[test]
fn has_comments() {
    let (articles, _) = gateways();
    assert!(articles.has_comments(1).unwrap());
    assert!(articles.has_comments(2).unwrap());
    assert!(!articles.has_comments(4).unwrap());
    assert!(!articles.has_comments(888).unwrap());
}

#[test]
fn find_all_comments() {
    let (articles, _) = gateways();
    assert_eq!(articles.find_all_comments(1).count().unwrap(), 2);
    assert_eq!(articles.find_all_comments(2).count().unwrap(), 2);
    assert_eq!(articles.find_all_comments(3).count().unwrap(), 1);
    assert_eq!(articles.find_all_comments(4).count().unwrap(), 0);
    assert_eq!(articles.find_all_comments(888).count().unwrap(), 0);
}

#[test]
fn fetch_all_comments_oldest_first() {
    let (articles, _) = gateways();

    let rows = articles.fetch_all_comments(1).unwrap();
    let ids: Vec<_> = rows.iter().filter_map(|r| r.get_i64("id")).collect();
    assert_eq!(ids, vec![2, 1]);

    assert_eq!(articles.fetch_all_comments(3).unwrap().len(), 1);
    assert!(articles.fetch_all_comments(4).unwrap().is_empty());
    assert!(articles.fetch_all_comments(888).unwrap().is_empty());
}

#[test]
fn delete_all_comments() {
    let (articles, comments) = gateways();

    assert_eq!(articles.delete_all_comments(1).unwrap(), 2);
    assert!(!articles.has_comments(1).unwrap());
    assert_eq!(comments.find_all().count().unwrap(), 3);

    assert_eq!(articles.delete_all_comments(2).unwrap(), 2);
    assert_eq!(comments.find_all().count().unwrap(), 1);

    assert_eq!(articles.delete_all_comments(888).unwrap(), 0);
    assert_eq!(comments.find_all().count().unwrap(), 1);
    assert_eq!(articles.find_all().count().unwrap(), 4);
}

#[test]
fn update() {
    let (articles, _) = gateways();
    let data = Row::new().with("author", "John Paul Jones");

    assert_eq!(articles.update(1, data.clone()).unwrap(), 1);
    assert_eq!(articles.fetch(1).unwrap().unwrap().get_str("author"), Some("John Paul Jones"));

    assert_eq!(articles.update(vec![2, 3, 4], data).unwrap(), 3);
    assert_eq!(articles.fetch(4).unwrap().unwrap().get_str("author"), Some("John Paul Jones"));
}

#[test]
fn insert() {
    let (articles, _) = gateways();
    assert_eq!(articles.insert(article()).unwrap(), 5);
    assert_eq!(articles.find_all().count().unwrap(), 5);

    let row = articles.fetch(5).unwrap().unwrap();
    assert_eq!(row.get_str("author"), Some("Jimmy Doe"));
    assert_eq!(row.get_str("title"), Some("Fifth blog post"));
    // createdAt defaults to the insertion time
    assert!(row.get_str("createdAt").is_some());
}

#[test]
fn insert_duplicate_or_negative_primary() {
    let (articles, _) = gateways();
    assert!(articles.insert(article().with("id", 1)).unwrap_err().is_constraint());
    assert!(articles.insert(article().with("id", -5)).unwrap_err().is_constraint());
    assert_eq!(articles.find_all().count().unwrap(), 4);
}

#[test]
fn delete_cascades_to_comments() {
    let (articles, comments) = gateways();

    assert_eq!(articles.delete(1).unwrap(), 1);
    assert!(!articles.has_comments(1).unwrap());
    assert_eq!(articles.find_all().count().unwrap(), 3);
    assert_eq!(comments.find_all().count().unwrap(), 3);

    assert_eq!(articles.delete(vec![2, 3]).unwrap(), 2);
    assert_eq!(articles.find_all().count().unwrap(), 1);
    assert_eq!(comments.find_all().count().unwrap(), 0);
}

#[test]
fn delete_cascades_without_foreign_keys() {
    let (articles, comments) = gateways();
    articles.db().set_foreign_keys(false).unwrap();

    assert_eq!(articles.delete(vec![1, 2]).unwrap(), 2);
    assert_eq!(comments.find_all().count().unwrap(), 1);
    assert!(!articles.has_comments(1).unwrap());
    assert!(!articles.has_comments(2).unwrap());
}

#[test]
fn failed_comment_delete_rolls_back_article_delete() {
    let (articles, comments) = gateways();
    exec(
        articles.db(),
        "CREATE TRIGGER keep_comments BEFORE DELETE ON Comments
         BEGIN SELECT RAISE(ABORT, 'comments are locked'); END;",
    );

    for fk in [true, false] {
        articles.db().set_foreign_keys(fk).unwrap();
        assert!(articles.delete(1).is_err());
        assert!(articles.article_exists(1).unwrap());
        assert_eq!(articles.find_all().count().unwrap(), 4);
        assert_eq!(comments.find_all().count().unwrap(), 5);
    }
}

#[test]
fn flush_table() {
    let (articles, comments) = gateways();
    comments.flush_table().unwrap();
    articles.flush_table().unwrap();
    assert_eq!(articles.find_all().count().unwrap(), 0);
}
