//! Execution paths against an in-memory connection.

use querymap::{
    Connection, FetchAs, FromRecord, OrmError, OrmResult, Output, Record, RowStream, Statement,
    Value, cond, table, transactional,
};
use std::collections::VecDeque;
use std::sync::Mutex;

enum Canned {
    Rows(Vec<Record>),
    Affected(u64),
    Fail(&'static str),
}

/// Records every statement and answers with queued responses.
///
/// Transaction control statements always succeed; anything else with an
/// empty queue yields no rows.
#[derive(Default)]
struct FakeConnection {
    log: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<Canned>>,
}

impl FakeConnection {
    fn respond(self, canned: Canned) -> Self {
        self.responses.lock().unwrap().push_back(canned);
        self
    }

    fn sql_log(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    fn last(&self) -> Statement {
        self.log.lock().unwrap().last().cloned().unwrap()
    }
}

impl Connection for FakeConnection {
    async fn execute(&self, statement: &Statement) -> OrmResult<Output> {
        self.log.lock().unwrap().push(statement.clone());
        if matches!(statement.sql.as_str(), "BEGIN" | "COMMIT" | "ROLLBACK") {
            return Ok(Output::Affected(0));
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Canned::Rows(records)) => Ok(Output::Rows(RowStream::from_records(records))),
            Some(Canned::Affected(n)) => Ok(Output::Affected(n)),
            Some(Canned::Fail(message)) => Err(OrmError::Other(message.to_string())),
            None => Ok(Output::Rows(RowStream::from_records(Vec::new()))),
        }
    }
}

fn author(id: i64, name: &str) -> Record {
    Record::new().with("id", id).with("name", name)
}

#[derive(Debug, PartialEq)]
struct Author {
    id: i64,
    name: String,
}

impl FromRecord for Author {
    fn from_record(record: &Record) -> OrmResult<Self> {
        let id = record
            .try_get("id")?
            .as_i64()
            .ok_or_else(|| OrmError::decode("id", "expected an integer"))?;
        let name = record
            .try_get("name")?
            .as_str()
            .ok_or_else(|| OrmError::decode("name", "expected text"))?
            .to_string();
        Ok(Author { id, name })
    }
}

#[tokio::test]
async fn find_without_match_is_not_found() {
    let conn = FakeConnection::default();
    let err = table(("authors", "author"))
        .find_where(&conn, 42)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, OrmError::NotFound { ref table, .. } if table == "authors"));
    assert_eq!(
        conn.last().sql,
        "SELECT author.* FROM authors AS author WHERE author.id = ? LIMIT 1"
    );
    assert_eq!(conn.last().params, vec![Value::Int(42)]);
}

#[tokio::test]
async fn first_without_match_is_none() {
    let conn = FakeConnection::default();
    let first = table("authors").first(&conn).await.unwrap();
    assert!(first.is_none());
}

#[tokio::test]
async fn find_returns_the_first_row() {
    let conn = FakeConnection::default().respond(Canned::Rows(vec![author(1, "ann")]));
    let record = table("authors").find_where(&conn, 1).await.unwrap();
    assert_eq!(record.get("name"), Some(&Value::from("ann")));
}

#[tokio::test]
async fn all_is_lazy_and_rewindable() {
    let conn = FakeConnection::default().respond(Canned::Rows(vec![
        author(1, "ann"),
        author(2, "bob"),
        author(3, "cy"),
    ]));
    let mut rows = table("authors").all(&conn).await.unwrap();

    assert!(rows.has_next().await.unwrap());
    assert_eq!(rows.current().unwrap().get("id"), Some(&Value::Int(1)));
    rows.advance();
    assert_eq!(rows.next().await.unwrap().unwrap().get("id"), Some(&Value::Int(2)));

    assert_eq!(rows.row_count().await.unwrap(), 3);
    assert_eq!(rows.position(), 2);

    rows.rewind();
    let ids: Vec<i64> = rows
        .try_collect()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(conn.sql_log().len(), 1);
}

#[tokio::test]
async fn count_counts_result_rows() {
    let conn = FakeConnection::default()
        .respond(Canned::Rows(vec![author(1, "ann"), author(2, "bob")]));
    let n = table("authors")
        .count_where(&conn, cond! { "name" => expr_like() })
        .await
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        conn.last().sql,
        "SELECT authors.* FROM authors WHERE authors.name LIKE ?"
    );
}

fn expr_like() -> querymap::Expr {
    querymap::expr::like("a%")
}

#[tokio::test]
async fn insert_returns_the_generated_key() {
    let conn = FakeConnection::default()
        .respond(Canned::Rows(vec![Record::new().with("id", 7_i64)]));
    let id = table("authors")
        .insert(&conn, [("email", "a@example.com")])
        .await
        .unwrap();

    assert_eq!(id, Some(Value::Int(7)));
    assert_eq!(
        conn.last().sql,
        "INSERT INTO authors (email) VALUES (?) RETURNING *"
    );
}

#[tokio::test]
async fn insert_into_table_without_id_returns_its_first_column() {
    let conn = FakeConnection::default().respond(Canned::Rows(vec![
        Record::new().with("author_id", 1_i64).with("book_id", 2_i64),
    ]));
    let key = table("author_books")
        .insert(&conn, [("author_id", 1_i64), ("book_id", 2_i64)])
        .await
        .unwrap();

    assert_eq!(key, Some(Value::Int(1)));
    assert_eq!(
        conn.last().sql,
        "INSERT INTO author_books (author_id,book_id) VALUES (?,?) RETURNING *"
    );
}

#[tokio::test]
async fn insert_prefers_the_configured_primary_key() {
    let conn = FakeConnection::default().respond(Canned::Rows(vec![
        Record::new()
            .with("title", "Dune")
            .with("isbn", "978-0441013593"),
    ]));
    let key = querymap::Query::with_primary_key("books", "isbn")
        .insert(&conn, [("title", "Dune")])
        .await
        .unwrap();

    assert_eq!(key, Some(Value::from("978-0441013593")));
    assert!(conn.last().sql.ends_with(" RETURNING *"));
}

#[tokio::test]
async fn insert_without_returned_rows_is_none() {
    let conn = FakeConnection::default().respond(Canned::Affected(1));
    let id = table("authors")
        .dialect(std::sync::Arc::new(querymap::Ansi))
        .insert(&conn, [("email", "a@example.com")])
        .await
        .unwrap();
    assert_eq!(id, None);
    assert_eq!(conn.last().sql, "INSERT INTO authors (email) VALUES (?)");
}

#[tokio::test]
async fn update_and_delete_report_affected_rows() {
    let conn = FakeConnection::default()
        .respond(Canned::Affected(3))
        .respond(Canned::Affected(1));
    let authors = table(("authors", "author"));

    let updated = authors
        .update_where(&conn, cond! { "role_id" => 1 }, [("role_id", 2)])
        .await
        .unwrap();
    assert_eq!(updated, 3);
    assert_eq!(
        conn.last().sql,
        "UPDATE authors AS author SET role_id = ? WHERE author.role_id = ?"
    );
    assert_eq!(conn.last().params, vec![Value::Int(2), Value::Int(1)]);

    let deleted = authors.delete_where(&conn, 9).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(
        conn.last().sql,
        "DELETE FROM authors AS author WHERE author.id = ?"
    );

    // The base query is untouched by the *_where variants.
    assert!(authors.where_clause().is_empty());
}

#[tokio::test]
async fn construction_errors_never_reach_the_connection() {
    let conn = FakeConnection::default();
    let err = querymap::Query::empty().delete(&conn).await.unwrap_err();
    assert!(err.is_construction());
    assert!(conn.sql_log().is_empty());
}

#[tokio::test]
async fn raw_statements_return_rows_or_counts() {
    let conn = FakeConnection::default()
        .respond(Canned::Affected(5))
        .respond(Canned::Rows(vec![author(1, "ann")]));
    let query = table("authors");

    let outcome = query
        .raw(&conn, Statement::raw("UPDATE authors SET active = true"))
        .await
        .unwrap();
    assert_eq!(outcome.affected(), Some(5));

    let outcome = query
        .raw(
            &conn,
            Statement::new("SELECT * FROM authors WHERE id = ?", vec![Value::Int(1)]),
        )
        .await
        .unwrap();
    let rows = outcome.into_rows().unwrap().try_collect().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn fetch_strategies_map_rows() {
    let conn = FakeConnection::default()
        .respond(Canned::Rows(vec![author(1, "ann")]))
        .respond(Canned::Rows(vec![author(2, "bob")]))
        .respond(Canned::Rows(vec![author(3, "cy")]));

    let typed = table("authors")
        .fetch_as(FetchAs::<Author>::of())
        .find(&conn)
        .await
        .unwrap();
    assert_eq!(
        typed,
        Author {
            id: 1,
            name: "ann".into()
        }
    );

    let json = table("authors")
        .fetch_as(FetchAs::<serde_json::Value>::Object)
        .find(&conn)
        .await
        .unwrap();
    assert_eq!(json, serde_json::json!({ "id": 2, "name": "bob" }));

    let names = table("authors")
        .fetch_as(FetchAs::callback(|record: Record| {
            Ok(record.try_get("name")?.as_str().unwrap_or_default().to_string())
        }))
        .all(&conn)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(names, vec!["cy".to_string()]);
}

#[tokio::test]
async fn mismatched_identity_strategy_is_unexpected_value() {
    let conn = FakeConnection::default().respond(Canned::Rows(vec![author(1, "ann")]));
    let err = table("authors")
        .fetch_as(FetchAs::<Author>::Identity)
        .find(&conn)
        .await
        .unwrap_err();
    assert!(err.is_unexpected_value());
}

#[tokio::test]
async fn transactional_commits_on_success() {
    let conn = FakeConnection::default()
        .respond(Canned::Rows(vec![Record::new().with("id", 1_i64)]))
        .respond(Canned::Affected(1));

    let id = transactional(&conn, |conn| async move {
        let id = table("authors")
            .insert(conn, [("email", "a@example.com")])
            .await?;
        table("audit")
            .insert(conn, [("event", "author created")])
            .await?;
        Ok(id)
    })
    .await
    .unwrap();

    assert_eq!(id, Some(Value::Int(1)));
    let log = conn.sql_log();
    assert_eq!(log.first().map(String::as_str), Some("BEGIN"));
    assert_eq!(log.last().map(String::as_str), Some("COMMIT"));
    assert!(!log.iter().any(|s| s == "ROLLBACK"));
}

#[tokio::test]
async fn transactional_rolls_back_and_returns_the_body_error() {
    let conn = FakeConnection::default().respond(Canned::Fail("duplicate email"));

    let err = transactional(&conn, |conn| async move {
        table("authors")
            .insert(conn, [("email", "a@example.com")])
            .await?;
        Ok(())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, OrmError::Other(ref m) if m == "duplicate email"));
    assert_eq!(
        conn.sql_log(),
        vec![
            "BEGIN".to_string(),
            "INSERT INTO authors (email) VALUES (?) RETURNING *".to_string(),
            "ROLLBACK".to_string(),
        ]
    );
}
