//! Query definitions shared by the integration tests.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use anyhow::anyhow;
use incr_query::{Query, QueryContext, QueryResult};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static CALLS: RefCell<HashMap<&'static str, usize>> = RefCell::new(HashMap::new());
}

/// Install the test logger and reset invocation counters.
pub fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
    CALLS.with(|calls| calls.borrow_mut().clear());
}

/// How many times a query's logic ran on this thread since `setup`.
pub fn calls(name: &str) -> usize {
    CALLS.with(|calls| calls.borrow().get(name).copied().unwrap_or_default())
}

fn record(name: &'static str) {
    CALLS.with(|calls| *calls.borrow_mut().entry(name).or_default() += 1);
}

/// Unit input.
pub struct SomeInput;

impl Query for SomeInput {
    type Key = ();
    type Value = i64;

    fn name() -> &'static str {
        "some_input"
    }
}

/// `some_input * 2`.
pub struct TwiceInput;

impl Query for TwiceInput {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        record(Self::name());
        Ok(*ctx.query_unit::<SomeInput>()? * 2)
    }

    fn name() -> &'static str {
        "twice_input"
    }
}

/// `twice_input * 2`.
pub struct QuadrupleInput;

impl Query for QuadrupleInput {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        record(Self::name());
        Ok(*ctx.query_unit::<TwiceInput>()? * 2)
    }

    fn name() -> &'static str {
        "quadruple_input"
    }
}

/// `key + key`, reading nothing.
pub struct DoubleArgument;

impl Query for DoubleArgument {
    type Key = i64;
    type Value = i64;

    fn execute(_ctx: &mut QueryContext<'_>, key: &i64) -> QueryResult<i64> {
        record(Self::name());
        Ok(key + key)
    }

    fn name() -> &'static str {
        "double_argument"
    }
}

/// `double_argument(some_input) + key.len()`.
pub struct Transitive;

impl Query for Transitive {
    type Key = String;
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, key: &String) -> QueryResult<i64> {
        record(Self::name());
        let input = *ctx.query_unit::<SomeInput>()?;
        let doubled = *ctx.query::<DoubleArgument>(input)?;
        Ok(doubled + key.len() as i64)
    }

    fn name() -> &'static str {
        "transitive"
    }
}

/// Keyed string input.
pub struct InputString;

impl Query for InputString {
    type Key = String;
    type Value = String;

    fn name() -> &'static str {
        "input_string"
    }
}

/// Length of `input_string(key)`.
pub struct Length;

impl Query for Length {
    type Key = String;
    type Value = usize;

    fn execute(ctx: &mut QueryContext<'_>, key: &String) -> QueryResult<usize> {
        record(Self::name());
        Ok(ctx.query::<InputString>(key.clone())?.len())
    }

    fn name() -> &'static str {
        "length"
    }
}

/// The longest `input_string` among the keys.
pub struct Longest;

impl Query for Longest {
    type Key = Vec<String>;
    type Value = Option<String>;

    fn execute(ctx: &mut QueryContext<'_>, keys: &Vec<String>) -> QueryResult<Option<String>> {
        record(Self::name());
        let mut best: Option<(usize, &String)> = None;
        for key in keys {
            let length = *ctx.query::<Length>(key.clone())?;
            if best.is_none_or(|(longest, _)| length > longest) {
                best = Some((length, key));
            }
        }
        match best {
            Some((_, key)) => Ok(Some((*ctx.query::<InputString>(key.clone())?).clone())),
            None => Ok(None),
        }
    }

    fn name() -> &'static str {
        "longest"
    }
}

/// `key + cyclic(key)`: always a cycle.
pub struct Cyclic;

impl Query for Cyclic {
    type Key = i64;
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, key: &i64) -> QueryResult<i64> {
        Ok(key + *ctx.query::<Self>(*key)?)
    }

    fn name() -> &'static str {
        "cyclic"
    }
}

/// Odd keys below two resolve to themselves; everything else recurses on `key % 2`.
pub struct PossiblyCyclic;

impl Query for PossiblyCyclic {
    type Key = i64;
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, key: &i64) -> QueryResult<i64> {
        if *key < 2 && key % 2 == 1 {
            Ok(*key)
        } else {
            Ok(*ctx.query::<Self>(key % 2)?)
        }
    }

    fn name() -> &'static str {
        "possibly_cyclic"
    }
}

/// Reads `pong(key)`.
pub struct Ping;

impl Query for Ping {
    type Key = u32;
    type Value = u32;

    fn execute(ctx: &mut QueryContext<'_>, key: &u32) -> QueryResult<u32> {
        Ok(*ctx.query::<Pong>(*key)?)
    }

    fn name() -> &'static str {
        "ping"
    }
}

/// Reads `ping(key)`.
pub struct Pong;

impl Query for Pong {
    type Key = u32;
    type Value = u32;

    fn execute(ctx: &mut QueryContext<'_>, key: &u32) -> QueryResult<u32> {
        Ok(*ctx.query::<Ping>(*key)?)
    }

    fn name() -> &'static str {
        "pong"
    }
}

/// `some_input`, rejecting negative values.
pub struct NonNegative;

impl Query for NonNegative {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        record(Self::name());
        let value = *ctx.query_unit::<SomeInput>()?;
        if value < 0 {
            return Err(anyhow!("negative input {value}").into());
        }
        Ok(value)
    }

    fn name() -> &'static str {
        "non_negative"
    }
}

/// `non_negative + 1`.
pub struct Successor;

impl Query for Successor {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        Ok(*ctx.query_unit::<NonNegative>()? + 1)
    }

    fn name() -> &'static str {
        "successor"
    }
}

/// `non_negative`, or `-1` when it fails.
pub struct Fallback;

impl Query for Fallback {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        record(Self::name());
        Ok(ctx.query_unit::<NonNegative>().map_or(-1, |value| *value))
    }

    fn name() -> &'static str {
        "fallback"
    }
}

/// `100 / some_input`: panics on zero.
pub struct HundredOver;

impl Query for HundredOver {
    type Key = ();
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, _key: &()) -> QueryResult<i64> {
        record(Self::name());
        Ok(100 / *ctx.query_unit::<SomeInput>()?)
    }

    fn name() -> &'static str {
        "hundred_over"
    }
}

/// `chain(0) = some_input`, `chain(n) = chain(n - 1) + 1`.
pub struct Chain;

impl Query for Chain {
    type Key = u32;
    type Value = i64;

    fn execute(ctx: &mut QueryContext<'_>, key: &u32) -> QueryResult<i64> {
        match key.checked_sub(1) {
            None => Ok(*ctx.query_unit::<SomeInput>()?),
            Some(previous) => Ok(*ctx.query::<Self>(previous)? + 1),
        }
    }

    fn name() -> &'static str {
        "chain"
    }
}
