use std::sync::Arc;

use bunnydb_testkit::{
    Container, DatabaseConnection, Error, LastInsertIdSource, MockOptions, MockedDbTestCase,
    Params, PipelineConnection, Row, Value,
};

const SELECT_USER: &str = "SELECT * FROM users WHERE id = ?";
const INSERT_USER: &str = "INSERT INTO users (name) VALUES (?)";

/// A test case whose `"db"` starts out as a live connection nobody listens on.
fn test_case() -> MockedDbTestCase {
    let mut container = Container::new();
    container.set_instance(
        "db",
        Arc::new(PipelineConnection::new(
            "http://127.0.0.1:9/v2/pipeline",
            "token",
        )),
    );
    let mut case = MockedDbTestCase::new(container);
    case.set_up().expect("db must be bound");
    case
}

fn ann() -> Row {
    Row::new([("id", Value::integer(1)), ("name", Value::text("Ann"))])
}

#[test]
fn queued_user_is_returned_and_unqueued_id_fails() {
    let mut case = test_case();
    case.queue_db_result(SELECT_USER, [Value::integer(1)], vec![ann()]);
    let db = case.db().expect("db is bound");

    let mut cursor = db
        .query(SELECT_USER, [Value::integer(1)].into())
        .expect("queued query must hit");
    assert_eq!(cursor.num_rows(), 1);
    assert_eq!(cursor.fetch_all(), vec![ann()]);

    let err = db
        .query(SELECT_USER, [Value::integer(2)].into())
        .expect_err("unqueued binds must miss");
    match &err {
        Error::NoExpectationQueued { sql, params } => {
            assert_eq!(sql, SELECT_USER);
            assert_eq!(params, &Params::positional([Value::integer(2)]));
        }
        other => panic!("expected missing expectation, got {other:?}"),
    }
    assert!(err.to_string().contains(SELECT_USER));
}

#[test]
fn queued_insert_succeeds_and_surfaces_id() -> anyhow::Result<()> {
    let mut case = test_case();
    case.queue_insert_id(INSERT_USER, [Value::text("Bob")], 42);
    let db = case.db()?;

    assert!(db.execute(INSERT_USER, [Value::text("Bob")].into())?);
    assert_eq!(db.last_insert_id()?, Some(42));
    assert_eq!(db.last_insert_id()?, None);
    Ok(())
}

#[test]
fn unqueued_insert_names_statement() {
    let mut case = test_case();
    let db = case.db().expect("db is bound");

    let err = db
        .execute(INSERT_USER, [Value::text("Eve")].into())
        .expect_err("unqueued insert must miss");
    assert!(matches!(err, Error::NoInsertIdQueued { .. }));
    let message = err.to_string();
    assert!(message.contains(INSERT_USER));
    assert!(message.contains("\"Eve\""));
}

#[test]
fn non_insert_statements_need_no_expectation() {
    let mut case = test_case();
    let db = case.db().expect("db is bound");

    for sql in [
        "UPDATE t SET x=1",
        "DELETE FROM users WHERE id = ?",
        "CREATE TABLE t (id INTEGER)",
        "  update users set name = 'insert'",
    ] {
        assert!(db.execute(sql, [Value::integer(1)].into()).expect(sql));
    }
    assert!(db.table_exists("never_created").expect("always exists"));
}

#[test]
fn cursor_stays_exhausted() {
    let mut case = test_case();
    let rows = vec![ann(), Row::new([("id", Value::integer(2)), ("name", Value::text("Bob"))])];
    case.queue_db_result("SELECT * FROM users", (), rows.clone());
    let db = case.db().expect("db is bound");

    let mut cursor = db.query("SELECT * FROM users", ().into()).expect("hit");
    let fetched: Vec<Row> = std::iter::from_fn(|| cursor.fetch()).collect();
    assert_eq!(fetched, rows);
    for _ in 0..5 {
        assert_eq!(cursor.fetch(), None);
    }
    assert_eq!(cursor.num_rows(), 2);
}

#[test]
fn expectations_do_not_leak_between_tests() {
    let mut case = test_case();
    case.queue_db_result(SELECT_USER, [Value::integer(1)], vec![ann()])
        .queue_insert_id(INSERT_USER, [Value::text("Bob")], 42);

    case.set_up().expect("next test");
    let db = case.db().expect("db is bound");

    assert!(matches!(
        db.query(SELECT_USER, [Value::integer(1)].into()),
        Err(Error::NoExpectationQueued { .. })
    ));
    assert!(matches!(
        db.execute(INSERT_USER, [Value::text("Bob")].into()),
        Err(Error::NoInsertIdQueued { .. })
    ));
    assert_eq!(db.last_insert_id().expect("fifo"), None);
}

#[test]
fn fingerprint_is_order_and_type_sensitive() {
    let mut case = test_case();
    let sql = "SELECT * FROM pairs WHERE a = ? AND b = ?";
    case.queue_db_result(sql, [Value::integer(1), Value::integer(2)], vec![ann()]);
    let db = case.db().expect("db is bound");

    assert!(db
        .query(sql, [Value::integer(1), Value::integer(2)].into())
        .is_ok());
    for params in [
        Params::positional([Value::integer(2), Value::integer(1)]),
        Params::positional([Value::integer(1)]),
        Params::positional([Value::integer(1), Value::float(2.0)]),
        Params::positional([Value::integer(1), Value::text("2")]),
        Params::named([("a", Value::integer(1)), ("b", Value::integer(2))]),
    ] {
        assert!(db.query(sql, params).is_err());
    }
    assert!(db
        .query(&sql.to_lowercase(), [Value::integer(1), Value::integer(2)].into())
        .is_err());
}

#[test]
fn last_executed_source_ignores_queue_order() {
    let mut container = Container::new();
    container.set_instance(
        "db",
        Arc::new(PipelineConnection::new(
            "http://127.0.0.1:9/v2/pipeline",
            "token",
        )),
    );
    let mut case = MockedDbTestCase::new(container).with_options(
        MockOptions::default().with_last_insert_id(LastInsertIdSource::LastExecuted),
    );
    case.set_up().expect("db is bound");
    case.queue_insert_id(INSERT_USER, [Value::text("Bob")], 42)
        .queue_insert_id("INSERT INTO tags (label) VALUES (?)", [Value::text("x")], 7);
    let db = case.db().expect("db is bound");

    db.execute("INSERT INTO tags (label) VALUES (?)", [Value::text("x")].into())
        .expect("queued");
    assert_eq!(db.last_insert_id().expect("recorded"), Some(7));
    assert_eq!(case.store().pop_fifo_insert_id(), Some(42));
}

#[test]
fn next_case_on_same_registry_answers_from_its_own_store() {
    let mut first = test_case();
    first.queue_db_result(SELECT_USER, [Value::integer(1)], vec![ann()]);
    first
        .db()
        .expect("db is bound")
        .query(SELECT_USER, [Value::integer(1)].into())
        .expect("first case hits its own expectation");

    let mut second = MockedDbTestCase::new(first.into_registry());
    second.set_up().expect("db is still bound");
    let db = second.db().expect("db is bound");
    assert!(db.is_mock());

    let err = db
        .query(SELECT_USER, [Value::integer(1)].into())
        .expect_err("first case's rows must not leak");
    assert!(matches!(err, Error::NoExpectationQueued { .. }));

    let bob = Row::new([("id", Value::integer(2)), ("name", Value::text("Bob"))]);
    second.queue_db_result(SELECT_USER, [Value::integer(2)], vec![bob.clone()]);
    let rows = db
        .query(SELECT_USER, [Value::integer(2)].into())
        .expect("second case's expectation must be visible")
        .fetch_all();
    assert_eq!(rows, vec![bob]);
}
