use std::time;

use assert_matches::assert_matches;
use serde_json::json;

use crate::gooddata;
use gooddata::{Error, model::DiffRequest};

fn submitted(server: &crate::Scripted) {
    server.then_json(202, json!({"asyncTask": {"link": {"poll": "/gdc/projects/p1/model/diff/1"}}}));
}

#[test]
fn get_is_idempotent() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    submitted(&server);
    server.then(200, include_str!("../fixtures/model_diff.json"));

    let mut diff = gd.model().diff("p1", &DiffRequest::new(json!({})))?;
    let first = diff.get()?.clone();
    let second = diff.get()?.clone();

    assert_eq!(first, second);
    assert_eq!(server.count(), 2);

    Ok(())
}

#[test]
fn accepted_is_not_done() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    submitted(&server);
    server.then(202, "");

    let mut diff = gd.model().diff("p1", &DiffRequest::new(json!({})))?;
    assert!(!diff.is_done());
    assert_eq!(server.count(), 2);

    Ok(())
}

#[test]
fn timeout_leaves_future_usable() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    submitted(&server);

    let mut diff = gd.model().diff("p1", &DiffRequest::new(json!({})))?;
    assert_matches!(
        diff.get_timeout(time::Duration::from_millis(20)),
        Err(Error::Timeout { uri, .. }) if uri == "/gdc/projects/p1/model/diff/1"
    );
    assert!(diff.polls() >= 1);

    server.then(200, include_str!("../fixtures/model_diff.json"));
    assert_eq!(diff.get()?.update_maql().len(), 2);

    Ok(())
}
