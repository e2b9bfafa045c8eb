use axum::http::StatusCode;
use domains::{CommentId, CommentStore};
use integration_tests::fixtures::{identity, new_comment, ARTICLE};
use integration_tests::http::TestApp;
use services::DELETED_PLACEHOLDER;

const ESSAY: &str = "/essay/on-margins";

#[tokio::test]
async fn test_signed_out_post_redirects_to_login() {
    let app = TestApp::new();
    let res = app.post_form("/essay/on-margins/comments", "content=hello", None).await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/login"));
    assert!(app.comments.is_empty());
}

#[tokio::test]
async fn test_post_comment_then_see_it() {
    let app = TestApp::new();
    let cookie = app.sign_in("ada@example.org").await;

    let res = app
        .post_form("/essay/on-margins/comments", "content=A+first+thought", Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(res.location().unwrap().starts_with("/essay/on-margins#c-"));

    let page = app.get(ESSAY, Some(&cookie)).await;
    assert!(page.body.contains("Comments (1)"));
    assert!(page.body.contains("A first thought"));
    assert!(page.body.contains(">ada</strong>"));
    assert!(page.body.contains(">Delete</a>"));

    let metrics = app.get("/metrics", None).await;
    assert!(metrics.body.contains("marginalia_comments_posted_total 1"));
}

#[tokio::test]
async fn test_blank_comment_is_rejected() {
    let app = TestApp::new();
    let cookie = app.sign_in("ada@example.org").await;

    let res = app.post_form("/essay/on-margins/comments", "content=+++", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("Comments cannot be empty."));
    assert!(app.comments.is_empty());
}

#[tokio::test]
async fn test_comment_bodies_are_escaped() {
    let app = TestApp::new();
    let cookie = app.sign_in("ada@example.org").await;
    app.post_form(
        "/essay/on-margins/comments",
        "content=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
        Some(&cookie),
    )
    .await;

    let page = app.get(ESSAY, None).await;
    assert!(!page.body.contains("<script>alert(1)</script>"));
    assert!(page.body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn test_replies_are_teased_to_signed_out_readers() {
    let app = TestApp::new();
    let ada = identity("ada");
    let root = app.comments.insert(new_comment(&ada, ARTICLE, None, "root")).await.unwrap();
    let reply = app
        .comments
        .insert(new_comment(&ada, ARTICLE, Some(root.id), "hidden reply"))
        .await
        .unwrap();
    app.comments
        .insert(new_comment(&ada, ARTICLE, Some(reply.id), "hidden grandchild"))
        .await
        .unwrap();

    let anonymous = app.get(ESSAY, None).await;
    assert!(anonymous.body.contains("root"));
    assert!(anonymous.body.contains("Sign in to read 1 reply"));
    assert!(!anonymous.body.contains("hidden reply"));
    assert!(!anonymous.body.contains("hidden grandchild"));
    assert!(anonymous.body.contains("Sign in to reply"));

    let cookie = app.sign_in("bob@example.org").await;
    let signed_in = app.get(ESSAY, Some(&cookie)).await;
    assert!(signed_in.body.contains("hidden reply"));
    assert!(signed_in.body.contains("hidden grandchild"));
    assert!(!signed_in.body.contains("Sign in to read"));
}

#[tokio::test]
async fn test_reply_flow() {
    let app = TestApp::new();
    let ada = identity("ada");
    let root = app.comments.insert(new_comment(&ada, ARTICLE, None, "root")).await.unwrap();
    let cookie = app.sign_in("bob@example.org").await;

    let form = app.get(&format!("{ESSAY}?reply={}", root.id), Some(&cookie)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains(&format!("/essay/on-margins/comments/{}/reply", root.id)));

    let res = app
        .post_form(
            &format!("/essay/on-margins/comments/{}/reply", root.id),
            "content=Agreed",
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    let stored = app.comments.list(ARTICLE).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].parent_id, Some(root.id));
    assert_eq!(stored[1].author_display, "bob");
}

#[tokio::test]
async fn test_reply_to_unknown_comment_is_404() {
    let app = TestApp::new();
    let cookie = app.sign_in("bob@example.org").await;
    let res = app
        .post_form(
            "/essay/on-margins/comments/00000000-0000-0000-0000-000000000063/reply",
            "content=hello",
            Some(&cookie),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(app.comments.is_empty());
}

#[tokio::test]
async fn test_author_deletes_with_confirmation() {
    let app = TestApp::new();
    let cookie = app.sign_in("ada@example.org").await;
    app.post_form("/essay/on-margins/comments", "content=Regrettable", Some(&cookie)).await;
    let posted = app.comments.list(ARTICLE).await.unwrap().remove(0);
    let delete_path = format!("/essay/on-margins/comments/{}/delete", posted.id);

    let confirm = app.get(&delete_path, Some(&cookie)).await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert!(confirm.body.contains("Delete this comment?"));
    assert!(confirm.body.contains("Regrettable"));

    let res = app.post_form(&delete_path, "", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    let page = app.get(ESSAY, None).await;
    assert!(page.body.contains(DELETED_PLACEHOLDER));
    assert!(!page.body.contains("Regrettable"));
    assert!(app.comments.list(ARTICLE).await.unwrap()[0].is_deleted);
}

#[tokio::test]
async fn test_non_author_delete_is_forbidden() {
    let app = TestApp::new();
    let ada = identity("ada");
    let posted = app.comments.insert(new_comment(&ada, ARTICLE, None, "mine")).await.unwrap();
    let cookie = app.sign_in("mallory@example.org").await;

    let res = app
        .post_form(&format!("/essay/on-margins/comments/{}/delete", posted.id), "", Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.contains("You are not allowed to do that."));

    let stored = app.comments.list(ARTICLE).await.unwrap();
    assert!(!stored[0].is_deleted);
    assert_eq!(stored[0].content, "mine");
}

#[tokio::test]
async fn test_collapse_link_folds_thread() {
    let app = TestApp::new();
    let ada = identity("ada");
    let root = app.comments.insert(new_comment(&ada, ARTICLE, None, "root")).await.unwrap();
    app.comments
        .insert(new_comment(&ada, ARTICLE, Some(root.id), "tucked away"))
        .await
        .unwrap();
    let cookie = app.sign_in("bob@example.org").await;

    let open = app.get(ESSAY, Some(&cookie)).await;
    assert!(open.body.contains("Collapse thread"));
    assert!(open.body.contains(&format!("collapse={}", root.id)));
    assert!(open.body.contains("tucked away"));

    let folded = app.get(&format!("{ESSAY}?collapse={}", root.id), Some(&cookie)).await;
    assert_eq!(folded.status, StatusCode::OK);
    assert!(folded.body.contains("Expand thread"));
    assert!(!folded.body.contains("tucked away"));
    assert!(folded.body.contains("Comments (2)"));

    let junk = app.get(&format!("{ESSAY}?collapse=nope,{}", CommentId::new()), Some(&cookie)).await;
    assert_eq!(junk.status, StatusCode::OK);
    assert!(junk.body.contains("tucked away"));
}
