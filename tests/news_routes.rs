mod support;

use axum::http::StatusCode;

use support::{
    FilePart, REQUEST_LIMIT_BYTES, TestApp, body_text, get, jpeg, location, multipart_body,
    post_empty, post_multipart,
};

const FIELDS: [(&str, &str); 3] = [("title", "A"), ("summary", "B"), ("body", "C")];

#[tokio::test]
async fn root_redirects_to_news_list() {
    let app = TestApp::new().await;
    let response = app.send(get("/", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/news/");
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new().await;
    app.news.seed(3).await;

    let response = app.send(get("/news/", Some(&app.viewer_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    let third = html.find("Post 3").expect("post 3 listed");
    let second = html.find("Post 2").expect("post 2 listed");
    let first = html.find("Post 1").expect("post 1 listed");
    assert!(third < second && second < first);
}

#[tokio::test]
async fn list_without_trailing_slash_is_served() {
    let app = TestApp::new().await;
    let response = app.send(get("/news", Some(&app.viewer_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_without_file_uses_default_image() {
    let app = TestApp::new().await;

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, None),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/news/?status=added");

    let created = app.news.get(1).await.expect("row created");
    assert_eq!(created.title, "A");
    assert_eq!(created.summary, "B");
    assert_eq!(created.body, "C");
    assert_eq!(created.image, "default.jpg");
    assert!(app.stored_files().is_empty());

    let html = body_text(app.send(get("/news/?status=added", Some(&app.admin_token))).await).await;
    assert!(html.contains("News added"));
}

#[tokio::test]
async fn create_with_empty_file_part_counts_as_no_file() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "",
        content_type: "application/octet-stream",
        data: Vec::new(),
    };

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(location(&response), "/news/?status=added");
    assert_eq!(app.news.get(1).await.expect("row").image, "default.jpg");
}

#[tokio::test]
async fn create_with_valid_image_stores_file() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "Launch Day.JPG",
        content_type: "image/jpeg",
        data: jpeg(32),
    };

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;
    assert_eq!(location(&response), "/news/?status=added");

    let created = app.news.get(1).await.expect("row created");
    assert!(created.image.ends_with("-launch-day.jpg"));
    assert_eq!(app.stored_files(), vec![created.image]);
}

#[tokio::test]
async fn create_with_disallowed_type_persists_nothing() {
    let app = TestApp::new().await;

    for (filename, content_type) in [
        ("report.pdf", "application/pdf"),
        ("photo.pdf", "image/jpeg"),
        ("photo.jpg", "image/webp"),
    ] {
        let file = FilePart {
            filename,
            content_type,
            data: jpeg(8),
        };
        let response = app
            .send(post_multipart(
                "/news/create",
                &app.admin_token,
                multipart_body(&FIELDS, Some(file)),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/news/create?status=invalid_type");
    }

    assert_eq!(app.news.len().await, 0);
    assert!(app.stored_files().is_empty());

    let html = body_text(
        app.send(get(
            "/news/create?status=invalid_type",
            Some(&app.admin_token),
        ))
        .await,
    )
    .await;
    assert!(html.contains("File must be a valid type"));
}

#[tokio::test]
async fn create_with_oversized_image_persists_nothing() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "big.png",
        content_type: "image/png",
        data: jpeg(support::IMAGE_LIMIT_BYTES as usize),
    };

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(location(&response), "/news/create?status=too_large");
    assert_eq!(app.news.len().await, 0);
    assert!(app.stored_files().is_empty());

    let html = body_text(
        app.send(get("/news/create?status=too_large", Some(&app.admin_token)))
            .await,
    )
    .await;
    assert!(html.contains("File size must be less than 64 B"));
}

#[tokio::test]
async fn request_over_transport_limit_reports_size_failure() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "huge.gif",
        content_type: "image/gif",
        data: jpeg(REQUEST_LIMIT_BYTES * 2),
    };

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/news/create?status=too_large");
    assert_eq!(app.news.len().await, 0);
}

#[tokio::test]
async fn create_with_blank_title_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&[("title", "  "), ("summary", "B"), ("body", "C")], None),
        ))
        .await;

    assert_eq!(location(&response), "/news/create?status=missing_title");
    assert_eq!(app.news.len().await, 0);
}

#[tokio::test]
async fn edit_with_valid_image_only_touches_target_row() {
    let app = TestApp::new().await;
    app.news.seed(6).await;
    let untouched = app.news.get(4).await;

    let file = FilePart {
        filename: "cover.jpeg",
        content_type: "image/jpeg",
        data: jpeg(40),
    };
    let response = app
        .send(post_multipart(
            "/news/edit/5",
            &app.admin_token,
            multipart_body(
                &[("title", "New title"), ("summary", "New summary"), ("body", "New body")],
                Some(file),
            ),
        ))
        .await;

    assert_eq!(location(&response), "/news/?status=updated");
    let edited = app.news.get(5).await.expect("row 5");
    assert_eq!(edited.title, "New title");
    assert!(edited.image.ends_with("-cover.jpeg"));
    assert_eq!(app.news.get(4).await, untouched);
    assert_eq!(app.stored_files(), vec![edited.image]);
}

#[tokio::test]
async fn edit_without_file_keeps_previous_image() {
    let app = TestApp::new().await;
    app.news.seed(2).await;
    app.news.rows.lock().await.get_mut(&2).expect("row 2").image = "kept.png".to_string();

    let response = app
        .send(post_multipart(
            "/news/edit/2",
            &app.admin_token,
            multipart_body(&FIELDS, None),
        ))
        .await;

    assert_eq!(location(&response), "/news/?status=updated");
    let edited = app.news.get(2).await.expect("row 2");
    assert_eq!(edited.image, "kept.png");
    assert_eq!(edited.title, "A");
}

#[tokio::test]
async fn edit_with_invalid_file_returns_to_edit_form() {
    let app = TestApp::new().await;
    app.news.seed(1).await;
    let before = app.news.get(1).await;

    let file = FilePart {
        filename: "notes.txt",
        content_type: "text/plain",
        data: b"hello".to_vec(),
    };
    let response = app
        .send(post_multipart(
            "/news/edit/1",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(location(&response), "/news/edit/1?status=invalid_type");
    assert_eq!(app.news.get(1).await, before);
}

#[tokio::test]
async fn edit_of_missing_post_reports_not_found_and_discards_upload() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "late.png",
        content_type: "image/png",
        data: jpeg(16),
    };

    let response = app
        .send(post_multipart(
            "/news/edit/99",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(location(&response), "/news/?status=not_found");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn edit_form_is_prefilled() {
    let app = TestApp::new().await;
    app.news.seed(1).await;

    let response = app.send(get("/news/edit/1", Some(&app.admin_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Summary 1"));
    assert!(html.contains(r#"action="/news/edit/1""#));
}

#[tokio::test]
async fn delete_removes_post_from_list() {
    let app = TestApp::new().await;
    app.news.seed(6).await;

    let response = app.send(post_empty("/news/delete/5", &app.admin_token)).await;
    assert_eq!(location(&response), "/news/?status=deleted");
    assert!(app.news.get(5).await.is_none());

    let html = body_text(app.send(get("/news/", Some(&app.admin_token))).await).await;
    assert!(!html.contains("Post 5"));
    assert!(html.contains("Post 6"));

    let again = app.send(post_empty("/news/delete/5", &app.admin_token)).await;
    assert_eq!(location(&again), "/news/?status=not_found");
}

#[tokio::test]
async fn delete_confirmation_shows_truncated_date() {
    let app = TestApp::new().await;
    app.news.seed(1).await;

    let response = app.send(get("/news/delete/1", Some(&app.admin_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Mon Jan 06 2025"));
    assert!(html.contains("Post 1"));
}

#[tokio::test]
async fn show_renders_post_and_missing_ids_are_404() {
    let app = TestApp::new().await;
    app.news.seed(1).await;

    let response = app.send(get("/news/show/1", Some(&app.viewer_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Body 1"));
    assert!(html.contains("Mon Jan 06 2025"));

    for uri in ["/news/show/42", "/news/show/not-a-number"] {
        let response = app.send(get(uri, Some(&app.viewer_token))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("News not found"));
    }

    let response = app.send(get("/news/edit/42", Some(&app.admin_token))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_needs_no_key() {
    let app = TestApp::new().await;
    let response = app.send(get("/_health/db", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn zero_byte_image_is_a_validation_failure() {
    let app = TestApp::new().await;
    let file = FilePart {
        filename: "empty.jpg",
        content_type: "image/jpeg",
        data: Vec::new(),
    };

    let response = app
        .send(post_multipart(
            "/news/create",
            &app.admin_token,
            multipart_body(&FIELDS, Some(file)),
        ))
        .await;

    assert_eq!(location(&response), "/news/create?status=empty_file");
    assert_eq!(app.news.len().await, 0);
    assert!(app.stored_files().is_empty());

    let html = body_text(
        app.send(get("/news/create?status=empty_file", Some(&app.admin_token)))
            .await,
    )
    .await;
    assert!(html.contains("File must not be empty"));
}

#[tokio::test]
async fn edit_with_oversized_image_leaves_row_unchanged() {
    let app = TestApp::new().await;
    app.news.seed(3).await;
    let before = app.news.get(2).await;

    let file = FilePart {
        filename: "poster.gif",
        content_type: "image/gif",
        data: jpeg(support::IMAGE_LIMIT_BYTES as usize + 1),
    };
    let response = app
        .send(post_multipart(
            "/news/edit/2",
            &app.admin_token,
            multipart_body(
                &[("title", "Changed"), ("summary", "Changed"), ("body", "Changed")],
                Some(file),
            ),
        ))
        .await;

    assert_eq!(location(&response), "/news/edit/2?status=too_large");
    assert_eq!(app.news.get(2).await, before);
    assert!(app.stored_files().is_empty());
}
