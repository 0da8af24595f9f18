use crate::common::{Field, TestApp, routes};

mod editor_image {
    use super::*;

    #[tokio::test]
    async fn stores_image_and_serves_it_back() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app
            .post_form(
                routes::EDITOR_IMAGE,
                vec![Field::file("file", "shot.png", "image/png", b"\x89PNG-bytes".to_vec())],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let location = res.body["location"].as_str().unwrap().to_string();
        assert!(location.starts_with("/uploads/tinymce/tinymce_"));
        assert!(location.ends_with(".png"));

        let rel = location.strip_prefix("/uploads/").unwrap();
        assert!(app.upload_dir.path().join(rel).exists());

        let served = app
            .client
            .get(format!("http://{}{}", app.addr, location))
            .send()
            .await
            .unwrap();
        assert_eq!(served.status(), 200);
        assert_eq!(
            served.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(served.bytes().await.unwrap().as_ref(), b"\x89PNG-bytes");
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app
            .post_form(
                routes::EDITOR_IMAGE,
                vec![Field::file("file", "run.sh", "application/x-sh", b"#!/bin/sh".to_vec())],
                &token,
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app
            .post_form(routes::EDITOR_IMAGE, vec![Field::text("other", "x")], &token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn requires_jury_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::EDITOR_IMAGE,
                vec![Field::file("file", "shot.png", "image/png", b"PNG".to_vec())],
                &app.team_token(),
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod serve {
    use super::*;

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token("/uploads/tinymce/tinymce_missing.png")
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unknown_bucket_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token("/uploads/secrets/passwd").await;
        assert_eq!(res.status, 400);
    }
}
