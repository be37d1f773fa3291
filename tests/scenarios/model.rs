use serde_json::json;

use crate::gooddata;
use gooddata::model::DiffRequest;

#[test]
fn diff_yields_maql() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    server
        .then_json(202, json!({"asyncTask": {"link": {"poll": "/gdc/projects/p1/model/diff/1"}}}))
        .then(202, "")
        .then(200, include_str!("../fixtures/model_diff.json"));

    let mut diff = gd.model().diff("p1", &DiffRequest::new(json!({"projectModel": {}})))?;
    let maql = diff.get()?.update_maql();

    assert_eq!(
        maql,
        [
            "CREATE DATASET {dataset.person} VISUAL(TITLE \"Person\");",
            "ALTER DATASET {dataset.person} DROP {attr.person.name};",
        ]
    );
    assert_eq!(server.requests()[0], (http::Method::POST, "/gdc/projects/p1/model/diff".to_owned()));
    assert_eq!(server.count(), 3);

    Ok(())
}

#[test]
fn diff_failure_is_mapped() -> anyhow::Result<()> {
    let (gd, server) = gooddata();
    server
        .then_json(202, json!({"asyncTask": {"link": {"poll": "/gdc/projects/p1/model/diff/1"}}}))
        .then_json(400, json!({"error": {"errorClass": "BadRequest", "message": "Invalid model"}}));

    let mut diff = gd.model().diff("p1", &DiffRequest::new(json!({})))?;
    let err = diff.get().unwrap_err();

    assert_eq!(err.to_string(), "Unable to get project model diff");
    assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));

    Ok(())
}
