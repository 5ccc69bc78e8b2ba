use crate::helpers::spawn_app;

#[tokio::test]
async fn status_for_unknown_message_is_404() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .get(app.url("/status/does-not-exist"))
        .bearer_auth(&app.service_token)
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn status_without_auth_is_unauthorized() {
    let app = spawn_app().await;

    let resp = reqwest::Client::new()
        .get(app.url("/status/M1"))
        .send()
        .await
        .expect("execute request");

    assert_eq!(resp.status().as_u16(), 401);
}
