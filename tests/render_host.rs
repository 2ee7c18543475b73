//! Integration tests for the render host

use md2svg::RenderHost;

#[test]
fn root_serves_the_template_page() {
    let host = RenderHost::start(None).expect("failed to start render host");
    let response = reqwest::blocking::get(host.url()).expect("request failed");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");

    let body = response.text().expect("failed to read body");
    assert!(body.contains("renderMindMap"));
    assert!(body.contains("id=\"mindmap\""));
}

#[test]
fn assets_are_served_with_inferred_content_type() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(dir.path().join("style.css"), "body { margin: 0; }").unwrap();

    let host = RenderHost::start(Some(dir.path().to_path_buf())).expect("failed to start");
    let url = format!("{}style.css", host.url());
    let response = reqwest::blocking::get(&url).expect("request failed");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert_eq!(content_type, "text/css");
    assert_eq!(response.text().unwrap(), "body { margin: 0; }");
}

#[test]
fn missing_assets_get_404() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let host = RenderHost::start(Some(dir.path().to_path_buf())).expect("failed to start");

    let url = format!("{}nope.js", host.url());
    let response = reqwest::blocking::get(&url).expect("request failed");
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn requests_outside_root_get_404_without_assets() {
    let host = RenderHost::start(None).expect("failed to start render host");
    let url = format!("{}anything", host.url());
    let response = reqwest::blocking::get(&url).expect("request failed");
    assert_eq!(response.status().as_u16(), 404);
}

#[test]
fn asset_directory_template_overrides_embedded_page() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        dir.path().join("template.html"),
        "<html><body>custom template</body></html>",
    )
    .unwrap();

    let host = RenderHost::start(Some(dir.path().to_path_buf())).expect("failed to start");
    let body = reqwest::blocking::get(host.url())
        .expect("request failed")
        .text()
        .unwrap();
    assert!(body.contains("custom template"));
}

#[test]
fn each_host_gets_its_own_ephemeral_port() {
    let a = RenderHost::start(None).expect("failed to start first host");
    let b = RenderHost::start(None).expect("failed to start second host");
    assert_ne!(a.port(), 0);
    assert_ne!(b.port(), 0);
    assert_ne!(a.port(), b.port());
}
