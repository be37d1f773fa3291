use assert_matches::assert_matches;
use serde_json::json;

use crate::gooddata;
use gooddata::{Error, ResourceKind};

#[test]
fn missing_account_carries_uri() {
    let (gd, server) = gooddata();
    server.then_json(404, json!({"error": {"errorCode": "gdc.account.not_found", "message": "Not found"}}));

    let err = gd.accounts().get_by_id("nobody").unwrap_err();
    assert_matches!(
        &err,
        Error::NotFound { kind: ResourceKind::Account, uri, .. } if uri == "/gdc/account/profile/nobody"
    );
    assert_eq!(err.to_string(), "Account not found: /gdc/account/profile/nobody");
}
