//! Walks through lazy invalidation with string lengths.
//!
//! Run with `RUST_LOG=info` for the walkthrough, or `RUST_LOG=trace` to also
//! see cache hits and verification.

use anyhow::Result;
use env_logger::init as env_logger_init;
use incr_query::{Query, QueryContext, QueryDatabase, QueryResult};
use log::info;

struct Text;

impl Query for Text {
    type Key = &'static str;
    type Value = String;

    fn name() -> &'static str {
        "text"
    }
}

struct Length;

impl Query for Length {
    type Key = &'static str;
    type Value = usize;

    fn execute(ctx: &mut QueryContext<'_>, key: &&'static str) -> QueryResult<usize> {
        info!("computing length({key})");
        Ok(ctx.query::<Text>(*key)?.len())
    }

    fn name() -> &'static str {
        "length"
    }
}

struct Longest;

impl Query for Longest {
    type Key = Vec<&'static str>;
    type Value = &'static str;

    fn execute(ctx: &mut QueryContext<'_>, keys: &Vec<&'static str>) -> QueryResult<&'static str> {
        info!("computing longest({keys:?})");
        let mut best = ("", 0);
        for &key in keys {
            let length = *ctx.query::<Length>(key)?;
            if length > best.1 {
                best = (key, length);
            }
        }
        Ok(best.0)
    }

    fn name() -> &'static str {
        "longest"
    }
}

fn main() -> Result<()> {
    env_logger_init();

    let mut db = QueryDatabase::new();
    db.set::<Text>("greeting", "hello".to_owned());
    db.set::<Text>("subject", "world".to_owned());
    db.set::<Text>("punctuation", "!".to_owned());

    let keys = vec!["greeting", "subject", "punctuation"];
    info!("longest = {}", db.query::<Longest>(keys.clone())?);

    info!("changing subject");
    db.set::<Text>("subject", "everybody".to_owned());
    info!("longest = {}", db.query::<Longest>(keys.clone())?);

    info!("setting an equal value");
    if !db.set_if_changed::<Text>("greeting", "hello".to_owned()) {
        info!("greeting unchanged, still at {}", db.current_revision());
    }
    info!("longest = {}", db.query::<Longest>(keys)?);

    db.log_dump();
    info!("{:?}", db.stats());
    Ok(())
}
