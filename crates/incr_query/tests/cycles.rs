//! Cycle detection between active queries.

mod common;

use common::{Cyclic, Ping, Pong, PossiblyCyclic, setup};
use incr_query::{QueryDatabase, QueryError};

fn cycle_of(error: &QueryError) -> (&str, Vec<&str>) {
    match error {
        QueryError::Cycle { key, stack } => {
            (key.as_str(), stack.iter().map(String::as_str).collect())
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    setup();
    let mut db = QueryDatabase::new();

    let error = db.query::<Cyclic>(2).unwrap_err();
    assert!(error.is_cycle());
    assert_eq!(cycle_of(&error), ("cyclic(2)", vec!["cyclic(2)"]));
    assert_eq!(
        error.to_string(),
        "cycle detected: cyclic(2) is already active in [cyclic(2)]"
    );
}

#[test]
fn only_some_arguments_cycle() {
    setup();
    let mut db = QueryDatabase::new();

    for key in [1, 3, 5] {
        assert_eq!(*db.query::<PossiblyCyclic>(key).unwrap(), 1, "key {key}");
    }

    for key in [2, 4, 8] {
        let error = db.query::<PossiblyCyclic>(key).unwrap_err();
        let expected_outer = format!("possibly_cyclic({key})");
        assert_eq!(
            cycle_of(&error),
            (
                "possibly_cyclic(0)",
                vec![expected_outer.as_str(), "possibly_cyclic(0)"]
            )
        );
    }
}

#[test]
fn mutual_recursion_reports_the_whole_stack() {
    setup();
    let mut db = QueryDatabase::new();

    let error = db.query::<Ping>(1).unwrap_err();
    assert_eq!(cycle_of(&error), ("ping(1)", vec!["ping(1)", "pong(1)"]));
}

#[test]
fn failed_cycles_leave_no_active_queries_behind() {
    setup();
    let mut db = QueryDatabase::new();

    assert!(db.query::<Ping>(7).unwrap_err().is_cycle());

    // Entering from the other side reports a stack that starts fresh.
    let error = db.query::<Pong>(7).unwrap_err();
    assert_eq!(cycle_of(&error), ("pong(7)", vec!["pong(7)", "ping(7)"]));

    assert_eq!(*db.query::<PossiblyCyclic>(3).unwrap(), 1);
    // possibly_cyclic(3) and the possibly_cyclic(1) it read.
    assert_eq!(db.stats().derived, 2);
}
