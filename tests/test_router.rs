use std::collections::HashMap;
use std::path::Path;

use tempfile::TempDir;
use triton::config::VirtualHosts;
use triton::http::request::{Request, RequestBuilder};
use triton::http::router::{route, Route};

fn site() -> (TempDir, VirtualHosts) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("www");
    std::fs::create_dir_all(root.join("docs")).unwrap();
    std::fs::write(root.join("index.html"), "home").unwrap();
    std::fs::write(root.join("docs/index.html"), "docs").unwrap();
    std::fs::write(root.join("docs/guide.txt"), "guide").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let mut map = HashMap::new();
    map.insert("example.com".to_string(), root);
    let hosts = VirtualHosts::load(&map).unwrap();

    (dir, hosts)
}

fn get(host: &str, path: &str) -> Request {
    RequestBuilder::new().host(host).path(path).build().unwrap()
}

fn root_of(hosts: &VirtualHosts) -> &Path {
    hosts.doc_root("example.com").unwrap()
}

#[tokio::test]
async fn test_route_existing_file() {
    let (_dir, hosts) = site();

    let outcome = route(&hosts, &get("example.com", "/docs/guide.txt")).await;
    assert_eq!(outcome, Route::File(root_of(&hosts).join("docs/guide.txt")));
}

#[tokio::test]
async fn test_route_trailing_slash_serves_index() {
    let (_dir, hosts) = site();

    assert_eq!(
        route(&hosts, &get("example.com", "/")).await,
        Route::File(root_of(&hosts).join("index.html"))
    );
    assert_eq!(
        route(&hosts, &get("example.com", "/docs/")).await,
        Route::File(root_of(&hosts).join("docs/index.html"))
    );
}

#[tokio::test]
async fn test_route_host_is_case_insensitive() {
    let (_dir, hosts) = site();

    assert!(matches!(
        route(&hosts, &get("EXAMPLE.com", "/")).await,
        Route::File(_)
    ));
}

#[tokio::test]
async fn test_route_unknown_host_is_bad_request() {
    let (_dir, hosts) = site();

    assert_eq!(
        route(&hosts, &get("unknown.example", "/")).await,
        Route::BadRequest
    );
}

#[tokio::test]
async fn test_route_missing_file_is_not_found() {
    let (_dir, hosts) = site();

    assert_eq!(
        route(&hosts, &get("example.com", "/nope.html")).await,
        Route::NotFound
    );
    // A directory without the trailing slash is not a file
    assert_eq!(
        route(&hosts, &get("example.com", "/docs")).await,
        Route::NotFound
    );
}

#[tokio::test]
async fn test_route_traversal_is_bad_request() {
    let (_dir, hosts) = site();

    for path in ["/../secret.txt", "/../../etc/passwd", "/docs/../../secret.txt"] {
        assert_eq!(
            route(&hosts, &get("example.com", path)).await,
            Route::BadRequest,
            "{path}"
        );
    }
}

#[tokio::test]
async fn test_route_dot_segments_inside_root() {
    let (_dir, hosts) = site();

    assert_eq!(
        route(&hosts, &get("example.com", "/docs/../index.html")).await,
        Route::File(root_of(&hosts).join("index.html"))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_route_symlink_escape_is_bad_request() {
    let (dir, hosts) = site();
    std::os::unix::fs::symlink(
        dir.path().join("secret.txt"),
        root_of(&hosts).join("leak.txt"),
    )
    .unwrap();

    assert_eq!(
        route(&hosts, &get("example.com", "/leak.txt")).await,
        Route::BadRequest
    );
}
