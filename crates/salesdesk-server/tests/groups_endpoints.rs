use axum::http::{Method, StatusCode};
use salesdesk_core::UserRole;
use serde_json::json;
use uuid::Uuid;

mod support;

use support::{member_ids, TestApp};

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn create_group_then_replace_members() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Admin", UserRole::Admin).await;
    let leader = app.seed_user("Leader", UserRole::Manager).await;
    let u2 = app.seed_user("Second", UserRole::Sales).await;
    let u3 = app.seed_user("Third", UserRole::Sales).await;

    let (status, created) = app
        .send_json(
            Method::POST,
            "/v1/groups",
            Some(&token),
            json!({ "name": "  Team Alpha ", "leader_id": leader.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created:?}");
    assert_eq!(created["name"], "Team Alpha");
    assert_eq!(created["members"][0]["role"], "LEADER");
    let group_id = created["id"].as_str().expect("group id").to_string();

    let (status, replaced) = app
        .send_json(
            Method::PUT,
            &format!("/v1/groups/{group_id}/members"),
            Some(&token),
            json!({ "user_ids": [u2.id, u3.id, u3.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "replace failed: {replaced:?}");
    let mut expected = vec![leader.id.to_string(), u2.id.to_string(), u3.id.to_string()];
    expected.sort();
    assert_eq!(member_ids(&replaced), expected);

    let (status, detail) = app
        .get_json(&format!("/v1/groups/{group_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member_ids(&detail), expected);
    let second = detail["members"]
        .as_array()
        .expect("members")
        .iter()
        .find(|member| member["user_id"] == json!(u2.id))
        .expect("second member");
    assert_eq!(second["role"], "MEMBER");
    assert_eq!(second["user"]["name"], "Second");
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn replacing_members_twice_is_idempotent() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Manager", UserRole::Manager).await;
    let leader = app.seed_user("Leader", UserRole::Manager).await;
    let u1 = app.seed_user("One", UserRole::Sales).await;
    let u2 = app.seed_user("Two", UserRole::Sales).await;
    let group = app.seed_group("Ops", leader.id).await;
    let uri = format!("/v1/groups/{}/members", group.id);
    let payload = json!({ "user_ids": [u1.id, u2.id] });

    let (status, first) = app
        .send_json(Method::PUT, &uri, Some(&token), payload.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = app.send_json(Method::PUT, &uri, Some(&token), payload).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["members"], second["members"]);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn replace_drops_members_outside_target_but_keeps_leader() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Admin", UserRole::Admin).await;
    let leader = app.seed_user("Leader", UserRole::Manager).await;
    let u1 = app.seed_user("One", UserRole::Sales).await;
    let u2 = app.seed_user("Two", UserRole::Sales).await;
    let group = app.seed_group("g1", leader.id).await;
    let uri = format!("/v1/groups/{}/members", group.id);

    let (status, _) = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "user_ids": [u1.id, u2.id] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "user_ids": [u2.id] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = vec![leader.id.to_string(), u2.id.to_string()];
    expected.sort();
    assert_eq!(member_ids(&body), expected);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn replace_with_unknown_user_changes_nothing() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Admin", UserRole::Admin).await;
    let leader = app.seed_user("Leader", UserRole::Manager).await;
    let u1 = app.seed_user("One", UserRole::Sales).await;
    let group = app.seed_group("g1", leader.id).await;
    let uri = format!("/v1/groups/{}/members", group.id);

    let (status, before) = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "user_ids": [u1.id] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send_json(
            Method::PUT,
            &uri,
            Some(&token),
            json!({ "user_ids": [Uuid::now_v7()] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown_user");

    let (_, after) = app
        .get_json(&format!("/v1/groups/{}", group.id), Some(&token))
        .await;
    assert_eq!(member_ids(&after), member_ids(&before));
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn create_group_validation_codes() {
    let app = TestApp::new().await;
    let (admin, token) = app.login_as("Admin", UserRole::Admin).await;

    let cases = [
        (json!({ "name": "   ", "leader_id": admin.id }), "invalid_name"),
        (json!({ "name": "Team" }), "leader_required"),
        (
            json!({ "name": "Team", "leader_id": Uuid::now_v7() }),
            "unknown_leader",
        ),
    ];
    for (payload, code) in cases {
        let (status, body) = app
            .send_json(Method::POST, "/v1/groups", Some(&token), payload)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "expected {code}");
        assert_eq!(body["error"], code);
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn update_group_reports_no_changes() {
    let app = TestApp::new().await;
    let (admin, token) = app.login_as("Admin", UserRole::Admin).await;
    let group = app.seed_group("Ops", admin.id).await;
    let uri = format!("/v1/groups/{}", group.id);

    let (status, body) = app.send_json(Method::PUT, &uri, Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no_changes");

    let (status, body) = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "name": "Ops" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no_changes");

    let (status, body) = app
        .send_json(Method::PUT, &uri, Some(&token), json!({ "name": "Ops West" }))
        .await;
    assert_eq!(status, StatusCode::OK, "rename failed: {body:?}");
    assert_eq!(body["name"], "Ops West");
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn single_member_add_and_remove() {
    let app = TestApp::new().await;
    let (admin, token) = app.login_as("Admin", UserRole::Admin).await;
    let user = app.seed_user("Joiner", UserRole::Sales).await;
    let group = app.seed_group("Ops", admin.id).await;
    let members_uri = format!("/v1/groups/{}/members", group.id);

    let (status, body) = app
        .send_json(
            Method::POST,
            &members_uri,
            Some(&token),
            json!({ "user_id": user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "add failed: {body:?}");
    assert_eq!(body["role"], "MEMBER");

    let (status, body) = app
        .send_json(
            Method::POST,
            &members_uri,
            Some(&token),
            json!({ "user_id": user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_member");

    let status = app
        .send_empty(
            Method::DELETE,
            &format!("{members_uri}/{}", admin.id),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = app
        .send_empty(
            Method::DELETE,
            &format!("{members_uri}/{}", user.id),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let status = app
        .send_empty(
            Method::DELETE,
            &format!("{members_uri}/{}", user.id),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn sales_can_read_but_not_rewrite_groups() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Seller", UserRole::Sales).await;
    let leader = app.seed_user("Leader", UserRole::Manager).await;
    let group = app.seed_group("Ops", leader.id).await;

    let (status, _) = app
        .get_json(&format!("/v1/groups/{}", group.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send_json(
            Method::PUT,
            &format!("/v1/groups/{}/members", group.id),
            Some(&token),
            json!({ "user_ids": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let status = app
        .send_empty(Method::DELETE, &format!("/v1/groups/{}", group.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn requests_without_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.get_json("/v1/groups", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get_json("/v1/groups", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn missing_group_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("Admin", UserRole::Admin).await;
    let missing = Uuid::now_v7();

    let (status, _) = app
        .get_json(&format!("/v1/groups/{missing}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_json(
            Method::PUT,
            &format!("/v1/groups/{missing}/members"),
            Some(&token),
            json!({ "user_ids": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let status = app
        .send_empty(Method::DELETE, &format!("/v1/groups/{missing}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn list_groups_returns_created_groups() {
    let app = TestApp::new().await;
    let (admin, token) = app.login_as("Admin", UserRole::Admin).await;
    app.seed_group("North", admin.id).await;
    app.seed_group("South", admin.id).await;

    let (status, body) = app.get_json("/v1/groups?sort=asc", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["groups"]
        .as_array()
        .expect("groups")
        .iter()
        .map(|group| group["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["North", "South"]);
}
