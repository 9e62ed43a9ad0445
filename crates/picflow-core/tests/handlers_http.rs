//! Integration tests: local-save and forward handlers against a local HTTP server.

mod common;

use std::collections::HashMap;

use picflow_core::album::Album;
use picflow_core::handlers::{AlbumHandler, Forwarder, HandlerError, LocalSaver};
use tempfile::tempdir;

fn routes(entries: &[(&str, u16, &[u8])]) -> HashMap<String, (u16, Vec<u8>)> {
    entries
        .iter()
        .map(|(p, s, b)| (p.to_string(), (*s, b.to_vec())))
        .collect()
}

#[tokio::test]
async fn local_saver_writes_every_picture() {
    let server = common::http_server::start(routes(&[
        ("/p/one.jpg", 200, b"first picture"),
        ("/p/two.png", 200, b"second"),
    ]));
    let dir = tempdir().unwrap();
    let saver = LocalSaver::new(dir.path());
    let album = Album::new("0042", "forum")
        .with_title("beach day")
        .with_urls([server.url("/p/one.jpg"), server.url("/p/two.png")])
        .with_header("Referer", "https://forum.example.com/");

    saver.handle(&album).await.expect("album saved");

    let album_dir = saver.album_dir(&album);
    assert_eq!(album_dir, dir.path().join("forum").join("0042_beach_day"));
    assert_eq!(std::fs::read(album_dir.join("001_one.jpg")).unwrap(), b"first picture");
    assert_eq!(std::fs::read(album_dir.join("002_two.png")).unwrap(), b"second");
    assert!(!album_dir.join("001_one.jpg.part").exists());

    let recorded = server.recorded();
    assert_eq!(recorded.len(), 2);
    assert!(recorded
        .iter()
        .all(|r| r.header("Referer") == Some("https://forum.example.com/")));
}

#[tokio::test]
async fn local_saver_skips_pictures_already_on_disk() {
    let server = common::http_server::start(routes(&[("/a.jpg", 200, b"fresh")]));
    let dir = tempdir().unwrap();
    let saver = LocalSaver::new(dir.path());
    let album = Album::new("7", "t").with_urls([server.url("/a.jpg")]);

    let album_dir = saver.album_dir(&album);
    std::fs::create_dir_all(&album_dir).unwrap();
    std::fs::write(album_dir.join("001_a.jpg"), b"kept").unwrap();

    saver.handle(&album).await.unwrap();
    assert_eq!(std::fs::read(album_dir.join("001_a.jpg")).unwrap(), b"kept");
    assert!(server.recorded().is_empty());
}

#[tokio::test]
async fn local_saver_reports_http_error_and_leaves_no_partial() {
    let server = common::http_server::start(routes(&[]));
    let dir = tempdir().unwrap();
    let saver = LocalSaver::new(dir.path());
    let album = Album::new("9", "t").with_urls([server.url("/missing.jpg")]);

    let err = saver.handle(&album).await.unwrap_err();
    assert!(matches!(err, HandlerError::Http { code: 404, .. }));
    let album_dir = saver.album_dir(&album);
    assert!(!album_dir.join("001_missing.jpg").exists());
    assert!(!album_dir.join("001_missing.jpg.part").exists());
}

#[tokio::test]
async fn local_saver_rejects_album_without_urls() {
    let dir = tempdir().unwrap();
    let saver = LocalSaver::new(dir.path());
    let err = saver.handle(&Album::new("x", "t")).await.unwrap_err();
    assert!(matches!(err, HandlerError::NoUrls(ref id) if id == "x"));
}

#[tokio::test]
async fn forwarder_posts_minimized_album() {
    let server = common::http_server::start(routes(&[("/hook", 204, b"")]));
    let forwarder = Forwarder::new(server.url("/hook"));
    let album = Album::new("0100", "gallery")
        .with_title("night")
        .with_urls(["https://img.example.com/1.jpg"])
        .with_header("Cookie", "session=secret");

    forwarder.handle(&album).await.expect("forwarded");

    let recorded = server.recorded();
    assert_eq!(recorded.len(), 1);
    let req = &recorded[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    let sent: Album = serde_json::from_slice(&req.body).unwrap();
    assert_eq!(sent, album.minimized());
    assert!(!String::from_utf8_lossy(&req.body).contains("secret"));
}

#[tokio::test]
async fn forwarder_maps_server_error() {
    let server = common::http_server::start(routes(&[("/hook", 503, b"busy")]));
    let forwarder = Forwarder::new(server.url("/hook"));
    let err = forwarder
        .handle(&Album::new("1", "t"))
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Http { code: 503, .. }));
}
