use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_is_reachable_without_auth() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .get(app.url("/health"))
        .send()
        .await
        .expect("execute request");

    assert!(resp.status().is_success());
}
