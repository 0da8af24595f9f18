use hackathon_server::entity::phase;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::common::{Field, TestApp, routes};

/// On-disk location of a stored upload given its public reference.
fn stored_path(app: &TestApp, url: &str) -> std::path::PathBuf {
    let rel = url.strip_prefix("/uploads/").expect("managed upload url");
    app.upload_dir.path().join(rel)
}

mod overview {
    use super::*;

    #[tokio::test]
    async fn lists_contests_latest_start_first() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let first = app.seed_contest("first").await;

        let res = app.get_with_token(routes::QUICK_ADD, &token).await;
        assert_eq!(res.status, 303);
        let newest = res
            .location
            .as_deref()
            .and_then(|l| l.strip_prefix("/jury/hackathon/"))
            .and_then(|l| l.strip_suffix("/display"))
            .and_then(|id| id.parse::<i32>().ok())
            .expect("redirect to the new contest's display page");

        let res = app.get_with_token(routes::HACKATHONS, &token).await;
        assert_eq!(res.status, 200);
        let contests = res.body["contests"].as_array().unwrap();
        assert_eq!(contests.len(), 2);
        // Both start one hour from creation; the quick-added one was created later.
        assert_eq!(contests[0]["id"].as_i64().unwrap() as i32, newest);
        assert_eq!(contests[1]["id"].as_i64().unwrap() as i32, first);
        assert_eq!(
            contests[1]["display_url"].as_str().unwrap(),
            routes::display(first)
        );
        assert_eq!(
            res.flashes(),
            vec![("success".into(), "Hackathon contest created!".into())]
        );
    }

    #[tokio::test]
    async fn quick_added_contest_gets_generated_name() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app.get_with_token(routes::QUICK_ADD, &token).await;
        let location = res.location.clone().expect("redirect location");

        let view = app.get_with_token(&location, &token).await;
        assert_eq!(view.status, 200);
        assert!(
            view.body["contest"]["name"]
                .as_str()
                .unwrap()
                .starts_with("New Hackathon ")
        );
        assert!(
            view.body["contest"]["shortname"]
                .as_str()
                .unwrap()
                .starts_with("hackathon_")
        );
    }

    #[tokio::test]
    async fn requires_token() {
        let app = TestApp::spawn().await;
        let res = app.get_without_token(routes::HACKATHONS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn requires_jury_role() {
        let app = TestApp::spawn().await;
        let contest_id = app.seed_contest("c1").await;
        let token = app.team_token();

        let res = app.get_with_token(routes::HACKATHONS, &token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![Field::text("title", "Nope")],
                &token,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod view_display {
    use super::*;

    #[tokio::test]
    async fn first_view_creates_display_data_and_single_default_phase() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["contest"]["id"].as_i64().unwrap() as i32, contest_id);
        assert_eq!(res.body["display_data"]["allow_phase"], false);
        assert_eq!(
            res.body["display_data"]["meta_data"],
            serde_json::json!([{ "": "" }])
        );

        let phases = res.body["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0]["name"], "Default Phase");
        assert_eq!(phases[0]["phase_order"], 1);
        assert_eq!(phases[0]["allow_submit"], true);
        assert_eq!(phases[0]["allow_manual_judge"], true);
        assert_eq!(phases[0]["allow_automatic_judge"], true);

        let again = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(again.status, 200);
        assert_eq!(again.body["phases"].as_array().unwrap().len(), 1);

        let stored = phase::Entity::find()
            .filter(phase::Column::ContestId.eq(contest_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn missing_contest_redirects_to_overview_with_flash() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app.get_with_token(&routes::display(9999), &token).await;
        res.assert_redirect(routes::HACKATHONS);

        let overview = app.get_with_token(routes::HACKATHONS, &token).await;
        assert_eq!(
            overview.flashes(),
            vec![("danger".into(), "Contest not found.".into())]
        );

        let drained = app.get_with_token(routes::HACKATHONS, &token).await;
        assert!(drained.flashes().is_empty());
    }
}

mod save_display {
    use super::*;

    #[tokio::test]
    async fn saves_text_fields_and_allow_phase() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![
                    Field::text("title", "Spring Hackathon"),
                    Field::text("subtitle", "48 hours"),
                    Field::text("banner_url", "https://cdn.example.com/banner.png"),
                    Field::text("description", "<p>Build things</p>"),
                    Field::text("allow_phase", "1"),
                ],
                &token,
            )
            .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let data = &view.body["display_data"];
        assert_eq!(data["title"], "Spring Hackathon");
        assert_eq!(data["subtitle"], "48 hours");
        assert_eq!(data["banner_url"], "https://cdn.example.com/banner.png");
        assert_eq!(data["description"], "<p>Build things</p>");
        assert_eq!(data["allow_phase"], true);
        assert_eq!(
            view.flashes(),
            vec![("success".into(), "Display data saved.".into())]
        );
    }

    #[tokio::test]
    async fn unchecked_allow_phase_keeps_phases_and_toggles_back() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        app.get_with_token(&routes::display(contest_id), &token).await;
        let res = app.post_empty(&routes::enable_phases(contest_id), &token).await;
        res.assert_redirect(&routes::phases(contest_id));
        for order in [2, 3] {
            let res = app
                .post_with_token(
                    &routes::phases(contest_id),
                    &serde_json::json!({ "name": format!("Round {order}"), "phase_order": order }),
                    &token,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        // Submitting without the checkbox turns phases off.
        app.post_form(
            &routes::display(contest_id),
            vec![Field::text("title", "T")],
            &token,
        )
        .await;
        let listed = app.get_with_token(&routes::phases(contest_id), &token).await;
        assert_eq!(listed.body["allow_phase"], false);
        assert_eq!(listed.body["phases"].as_array().unwrap().len(), 1);

        let stored = phase::Entity::find()
            .filter(phase::Column::ContestId.eq(contest_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(stored, 3);

        app.post_form(
            &routes::display(contest_id),
            vec![Field::text("title", "T"), Field::text("allow_phase", "on")],
            &token,
        )
        .await;
        let listed = app.get_with_token(&routes::phases(contest_id), &token).await;
        assert_eq!(listed.body["allow_phase"], true);
        assert_eq!(listed.body["phases"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn non_image_banner_is_rejected_without_changes() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        app.post_form(
            &routes::display(contest_id),
            vec![
                Field::text("title", "Original"),
                Field::text("banner_url", "https://cdn.example.com/old.png"),
            ],
            &token,
        )
        .await;

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![
                    Field::text("title", "Changed"),
                    Field::file("banner_file", "notes.txt", "text/plain", b"hello".to_vec()),
                ],
                &token,
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(
            view.body["display_data"]["banner_url"],
            "https://cdn.example.com/old.png"
        );
        assert_eq!(view.body["display_data"]["title"], "Original");
    }

    #[tokio::test]
    async fn oversized_banner_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![Field::file(
                    "banner_file",
                    "huge.png",
                    "image/png",
                    vec![0u8; 2 * 1024 * 1024 + 1],
                )],
                &token,
            )
            .await;
        assert_eq!(res.status, 400, "{}", res.text);
    }

    #[tokio::test]
    async fn title_longer_than_255_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![Field::text("title", "x".repeat(256))],
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn new_banner_replaces_and_deletes_previous_upload() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        app.post_form(
            &routes::display(contest_id),
            vec![Field::file("banner_file", "a.png", "image/png", b"PNG_A".to_vec())],
            &token,
        )
        .await;
        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let first = view.body["display_data"]["banner_url"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(first.starts_with(&format!("/uploads/hackathon_banners/banner_{contest_id}_")));
        assert!(first.ends_with(".png"));
        assert!(stored_path(&app, &first).exists());

        app.post_form(
            &routes::display(contest_id),
            vec![Field::file("banner_file", "b.jpg", "image/jpeg", b"JPG_B".to_vec())],
            &token,
        )
        .await;
        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let second = view.body["display_data"]["banner_url"]
            .as_str()
            .unwrap()
            .to_string();
        assert_ne!(first, second);
        assert!(second.ends_with(".jpg"));
        assert!(!stored_path(&app, &first).exists());
        assert!(stored_path(&app, &second).exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_banner() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        app.post_form(
            &routes::display(contest_id),
            vec![Field::file("banner_file", "a.png", "image/png", b"PNG_A".to_vec())],
            &token,
        )
        .await;
        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let first = view.body["display_data"]["banner_url"]
            .as_str()
            .unwrap()
            .to_string();

        app.execute_sql(
            "ALTER TABLE contest_display_data \
             ADD CONSTRAINT title_not_rejected CHECK (title IS DISTINCT FROM 'Rejected')",
        )
        .await;

        let res = app
            .post_form(
                &routes::display(contest_id),
                vec![
                    Field::text("title", "Rejected"),
                    Field::file("banner_file", "b.jpg", "image/jpeg", b"JPG_B".to_vec()),
                ],
                &token,
            )
            .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let flashes = view.flashes();
        assert_eq!(flashes.len(), 1, "{flashes:?}");
        assert_eq!(flashes[0].0, "danger");
        assert!(flashes[0].1.starts_with("Failed to save display data:"));
        assert_eq!(view.body["display_data"]["banner_url"], first.as_str());
        assert!(stored_path(&app, &first).exists());
        assert_eq!(app.stored_file_count("hackathon_banners"), 1);
    }

    #[tokio::test]
    async fn media_upload_appends_metadata_and_snippet_shows_once() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        app.post_form(
            &routes::display(contest_id),
            vec![Field::file("media_file", "clip.mp4", "video/mp4", b"MP4".to_vec())],
            &token,
        )
        .await;

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let meta = view.body["display_data"]["meta_data"].as_array().unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0]["type"], "media");
        assert_eq!(meta[0]["mediaType"], "video");
        let path = meta[0]["path"].as_str().unwrap();
        assert!(path.starts_with("/uploads/hackathon_media/"));
        assert!(meta[0]["uploadedAt"].is_string());
        assert_eq!(
            view.body["media_snippet"].as_str().unwrap(),
            format!("<video src=\"{path}\" controls></video>")
        );

        let again = app.get_with_token(&routes::display(contest_id), &token).await;
        assert!(again.body["media_snippet"].is_null());

        app.post_form(
            &routes::display(contest_id),
            vec![Field::file("media_file", "pic.png", "image/png", b"PNG".to_vec())],
            &token,
        )
        .await;
        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let meta = view.body["display_data"]["meta_data"].as_array().unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[1]["mediaType"], "image");
        assert!(
            view.body["media_snippet"]
                .as_str()
                .unwrap()
                .starts_with("<img src=\"/uploads/hackathon_media/")
        );
    }

    #[tokio::test]
    async fn missing_contest_redirects() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app
            .post_form(
                &routes::display(424242),
                vec![Field::text("title", "x")],
                &token,
            )
            .await;
        res.assert_redirect(routes::HACKATHONS);
    }
}
