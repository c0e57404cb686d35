use storefront_admin_api::routes::health::health_check;

#[tokio::test]
async fn health_check_names_the_running_build() {
    let axum::Json(body) = health_check().await;

    let data = body.data.expect("health data");
    assert_eq!(data.status, "up");
    assert_eq!(data.name, "storefront-admin-api");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(
        body.message,
        format!("storefront-admin-api {} is up", data.version)
    );
}
