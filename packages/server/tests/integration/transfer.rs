use serde_json::{Value, json};

use crate::common::{Field, TestApp, TestResponse, routes};

async fn import(app: &TestApp, contest_id: i32, document: &Value, token: &str) -> TestResponse {
    app.post_form(
        &routes::import(contest_id),
        vec![Field::file(
            "import_file",
            "export.json",
            "application/json",
            serde_json::to_vec(document).unwrap(),
        )],
        token,
    )
    .await
}

mod export {
    use super::*;

    #[tokio::test]
    async fn exports_display_data_and_phases_as_download() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;
        app.post_form(
            &routes::display(contest_id),
            vec![
                Field::text("title", "Expo"),
                Field::text("banner_url", "https://cdn.example.com/b.png"),
                Field::text("allow_phase", "1"),
            ],
            &token,
        )
        .await;
        app.get_with_token(&routes::display(contest_id), &token).await;

        let res = app
            .client
            .get(format!("http://{}{}", app.addr, routes::export(contest_id)))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(
            res.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
        assert_eq!(
            res.headers()["content-disposition"].to_str().unwrap(),
            format!("attachment; filename=\"contest_display_export_{contest_id}.json\"")
        );
        let body: Value = res.json().await.unwrap();

        assert_eq!(body["contest"]["id"], contest_id);
        assert_eq!(body["contest"]["shortname"], "c1");
        assert!(body["contest"]["starttime"].is_string());
        assert_eq!(body["displayData"]["title"], "Expo");
        assert_eq!(body["displayData"]["bannerUrl"], "https://cdn.example.com/b.png");
        assert_eq!(body["displayData"]["allowPhase"], true);
        let phases = body["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0]["name"], "Default Phase");
        assert_eq!(phases[0]["phase_order"], 1);
    }

    #[tokio::test]
    async fn contest_without_display_data_exports_null() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("bare").await;

        let res = app.get_with_token(&routes::export(contest_id), &token).await;
        assert_eq!(res.status, 200);
        assert!(res.body["displayData"].is_null());
        assert_eq!(res.body["phases"], json!([]));
    }

    #[tokio::test]
    async fn missing_contest_is_json_404() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();

        let res = app.get_with_token(&routes::export(8080), &token).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body, json!({ "error": "Contest not found" }));
    }
}

mod import_display {
    use super::*;

    #[tokio::test]
    async fn export_then_import_into_other_contest_round_trips() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let source = app.seed_contest("source").await;
        let target = app.seed_contest("target").await;

        app.post_form(
            &routes::display(source),
            vec![
                Field::text("title", "Round Trip"),
                Field::text("subtitle", "Sub"),
                Field::text("description", "<p>desc</p>"),
                Field::text("allow_phase", "1"),
            ],
            &token,
        )
        .await;
        app.get_with_token(&routes::display(source), &token).await;
        app.post_with_token(
            &routes::phases(source),
            &json!({
                "name": "Build",
                "start_time": 1000,
                "end_time": 2000,
                "allow_submit": true,
                "phase_order": 2,
                "metadata": { "k": "v" },
            }),
            &token,
        )
        .await;

        let exported = app.get_with_token(&routes::export(source), &token).await;
        assert_eq!(exported.status, 200);

        let res = import(&app, target, &exported.body, &token).await;
        res.assert_redirect(&routes::display(target));

        let view = app.get_with_token(&routes::display(target), &token).await;
        assert_eq!(
            view.flashes(),
            vec![("success".into(), "Import successful.".into())]
        );
        let data = &view.body["display_data"];
        assert_eq!(data["title"], "Round Trip");
        assert_eq!(data["subtitle"], "Sub");
        assert_eq!(data["description"], "<p>desc</p>");
        assert_eq!(data["allow_phase"], true);

        let phases = view.body["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0]["name"], "Default Phase");
        assert_eq!(phases[1]["name"], "Build");
        assert_eq!(phases[1]["start_time"], 1000.0);
        assert_eq!(phases[1]["end_time"], 2000.0);
        assert_eq!(phases[1]["allow_submit"], true);
        assert_eq!(phases[1]["metadata"]["k"], "v");

        let reexported = app.get_with_token(&routes::export(target), &token).await;
        for key in ["title", "subtitle", "bannerUrl", "description", "allowPhase"] {
            assert_eq!(
                reexported.body["displayData"][key], exported.body["displayData"][key],
                "{key}"
            );
        }
        // A missing list is imported as an empty one.
        assert_eq!(reexported.body["displayData"]["metaData"], json!([]));
        assert_eq!(reexported.body["phases"], exported.body["phases"]);
    }

    #[tokio::test]
    async fn empty_phase_list_removes_all_phases() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;
        app.get_with_token(&routes::display(contest_id), &token).await;

        let res = import(
            &app,
            contest_id,
            &json!({ "displayData": { "title": "Kept" }, "phases": [] }),
            &token,
        )
        .await;
        res.assert_redirect(&routes::display(contest_id));

        let listed = app.get_with_token(&routes::phases(contest_id), &token).await;
        assert_eq!(listed.body["phases"], json!([]));

        let exported = app.get_with_token(&routes::export(contest_id), &token).await;
        assert_eq!(exported.body["displayData"]["title"], "Kept");
        assert_eq!(exported.body["displayData"]["subtitle"], "");
        assert_eq!(exported.body["displayData"]["metaData"], json!([]));
    }

    #[tokio::test]
    async fn allow_phase_is_kept_when_absent() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;
        app.post_empty(&routes::enable_phases(contest_id), &token).await;

        import(
            &app,
            contest_id,
            &json!({ "displayData": { "title": "No flag" } }),
            &token,
        )
        .await;

        let exported = app.get_with_token(&routes::export(contest_id), &token).await;
        assert_eq!(exported.body["displayData"]["allowPhase"], true);
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app
            .post_form(
                &routes::import(contest_id),
                vec![Field::file(
                    "import_file",
                    "broken.json",
                    "application/json",
                    b"{ nope".to_vec(),
                )],
                &token,
            )
            .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(
            view.flashes(),
            vec![("danger".into(), "Invalid JSON file.".into())]
        );
    }

    #[tokio::test]
    async fn invalid_phase_aborts_without_changes() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;
        app.get_with_token(&routes::display(contest_id), &token).await;

        let res = import(
            &app,
            contest_id,
            &json!({
                "displayData": { "title": "Changed" },
                "phases": [
                    { "name": "One", "phase_order": 1 },
                    { "name": "Two", "phase_order": 1 },
                ],
            }),
            &token,
        )
        .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let flashes = view.flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].0, "danger");
        assert!(flashes[0].1.starts_with("Invalid import file:"));
        assert!(view.body["display_data"]["title"].is_null());
        let phases = view.body["phases"].as_array().unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0]["name"], "Default Phase");
    }

    #[tokio::test]
    async fn overlong_title_is_rejected_without_changes() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;
        app.get_with_token(&routes::display(contest_id), &token).await;

        let res = import(
            &app,
            contest_id,
            &json!({
                "displayData": { "title": "t".repeat(300), "bannerUrl": "b".repeat(400) },
                "phases": [],
            }),
            &token,
        )
        .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(
            view.flashes(),
            vec![(
                "danger".into(),
                "Invalid import file: displayData: Title must be at most 255 characters".into()
            )]
        );
        assert!(view.body["display_data"]["title"].is_null());
        assert!(view.body["display_data"]["banner_url"].is_null());
        assert_eq!(view.body["phases"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn object_metadata_survives_media_upload() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        import(
            &app,
            contest_id,
            &json!({ "displayData": { "title": "Themed", "metaData": { "theme": "dark" } } }),
            &token,
        )
        .await;
        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(view.body["display_data"]["meta_data"], json!([{ "theme": "dark" }]));

        app.post_form(
            &routes::display(contest_id),
            vec![
                Field::text("title", "Themed"),
                Field::file("media_file", "clip.mp4", "video/mp4", b"MP4".to_vec()),
            ],
            &token,
        )
        .await;

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        let meta = view.body["display_data"]["meta_data"].as_array().unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0], json!({ "theme": "dark" }));
        assert_eq!(meta[1]["type"], "media");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let app = TestApp::spawn().await;
        let token = app.jury_token();
        let contest_id = app.seed_contest("c1").await;

        let res = app
            .post_form(&routes::import(contest_id), vec![], &token)
            .await;
        res.assert_redirect(&routes::display(contest_id));

        let view = app.get_with_token(&routes::display(contest_id), &token).await;
        assert_eq!(
            view.flashes(),
            vec![(
                "danger".into(),
                "No file uploaded or upload error.".into()
            )]
        );
    }
}
