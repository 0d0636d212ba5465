//! End-to-end tests for the async loader together with distance and collision.
//!
//! Fixtures are written to temporary directories or served from a local
//! HTTP listener; nothing leaves the machine.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::Engine;
use glam::Vec3;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use scenery::config::LoaderConfig;
use scenery::{calculate_distance, check_collision, Bounded, LoadError, ModelLoader};

fn write_cube(dir: &Path, name: &str, min: f32, max: f32) {
    let obj = format!(
        "v {a} {a} {a}\nv {b} {a} {a}\nv {b} {b} {a}\nv {a} {b} {a}\n\
         v {a} {a} {b}\nv {b} {a} {b}\nv {b} {b} {b}\nv {a} {b} {b}\n\
         f 1 2 3 4\nf 5 6 7 8\n",
        a = min,
        b = max
    );
    std::fs::write(dir.join(name), obj).unwrap();
}

#[tokio::test]
async fn test_load_relative_to_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_cube(dir.path(), "cube.obj", 0.0, 1.0);

    let loader = ModelLoader::new(LoaderConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..LoaderConfig::default()
    });
    let model = loader.load("cube.obj").await.unwrap();

    assert_eq!(model.triangles.len(), 4);
    assert_eq!(model.compute_bounding_box().max, Vec3::ONE);
}

#[tokio::test]
async fn test_load_file_url() {
    let dir = tempfile::tempdir().unwrap();
    write_cube(dir.path(), "cube.obj", -2.0, 2.0);

    let url = format!("file://{}", dir.path().join("cube.obj").display());
    let model = ModelLoader::default().load(&url).await.unwrap();
    assert_eq!(model.compute_bounding_box().min, Vec3::splat(-2.0));
}

#[tokio::test]
async fn test_load_gltf_data_uri() {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
    let bytes: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
    let engine = base64::engine::general_purpose::STANDARD;
    let doc = format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
        "nodes":[{{"mesh":0}}],
        "meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}}}}]}}],
        "buffers":[{{"byteLength":36,"uri":"data:application/octet-stream;base64,{}"}}],
        "bufferViews":[{{"buffer":0,"byteLength":36}}],
        "accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3",
            "min":[0.0,0.0,0.0],"max":[2.0,2.0,0.0]}}]}}"#,
        engine.encode(&bytes)
    );
    let url = format!("data:model/gltf+json;base64,{}", engine.encode(doc));

    let model = ModelLoader::default().load(&url).await.unwrap();
    assert_eq!(model.triangles.len(), 1);
    assert_eq!(model.compute_bounding_box().max, Vec3::new(2.0, 2.0, 0.0));
}

#[tokio::test]
async fn test_failed_load_surfaces_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.obj"), "v 0 0 0\n").unwrap();
    let loader = ModelLoader::new(LoaderConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..LoaderConfig::default()
    });

    let missing = loader.load("nope.glb").await;
    assert!(matches!(missing, Err(LoadError::Io(_))));

    let empty = loader.load("broken.obj").await;
    assert!(matches!(empty, Err(LoadError::NoGeometry)));
}

#[tokio::test]
async fn test_remote_refused_when_disabled() {
    let loader = ModelLoader::new(LoaderConfig {
        allow_remote: false,
        ..LoaderConfig::default()
    });
    let err = loader
        .load("https://example.invalid/ship.glb")
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::RemoteDisabled(_)));
}

#[tokio::test]
async fn test_concurrent_loads_then_collide() {
    let dir = tempfile::tempdir().unwrap();
    write_cube(dir.path(), "a.obj", 0.0, 1.0);
    write_cube(dir.path(), "b.obj", 0.0, 1.0);

    let loader = ModelLoader::new(LoaderConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..LoaderConfig::default()
    });
    let (a, b) = tokio::join!(loader.load("a.obj"), loader.load("b.obj"));
    let a = a.unwrap();
    let mut b = b.unwrap();

    assert!(check_collision(&a, &b));

    // Touching faces still collide
    b.set_translation(Vec3::new(1.0, 0.0, 0.0));
    assert!(check_collision(&a, &b));

    b.set_translation(Vec3::new(3.0, 0.0, 0.0));
    assert!(!check_collision(&a, &b));

    let centers = (
        a.compute_bounding_box().center(),
        b.compute_bounding_box().center(),
    );
    assert_eq!(calculate_distance(centers.0, centers.1), 3.0);
}

#[tokio::test]
async fn test_same_url_loads_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    write_cube(dir.path(), "cube.obj", 0.0, 1.0);
    let path = dir.path().join("cube.obj").display().to_string();

    let loader = ModelLoader::default();
    let first = loader.spawn(path.clone());
    let second = loader.spawn(path);

    let mut a = first.await.unwrap().unwrap();
    let b = second.await.unwrap().unwrap();

    a.set_translation(Vec3::splat(10.0));
    assert_ne!(a.compute_bounding_box(), b.compute_bounding_box());
}

// ===========================================================================
// HTTP loading
// ===========================================================================

/// Serves fixed bodies on a local port, answering 404 for anything else.
/// Returns the base URL and the request paths seen so far.
async fn serve(routes: Vec<(&'static str, Vec<u8>)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes: Arc<HashMap<&'static str, Vec<u8>>> = Arc::new(routes.into_iter().collect());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = routes.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }

                let path = String::from_utf8_lossy(&request)
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                let route = path.split('?').next().unwrap_or("/");
                let (status, body) = match routes.get(route) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", Vec::new()),
                };
                log.lock().unwrap().push(path);

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (base, seen)
}

/// A one-triangle glTF whose buffer lives in the sibling file `tri.bin`.
fn external_triangle() -> (Vec<u8>, Vec<u8>) {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 3.0, 0.0];
    let bin: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
    let doc = r#"{"asset":{"version":"2.0"},"scene":0,"scenes":[{"nodes":[0]}],
        "nodes":[{"mesh":0}],
        "meshes":[{"primitives":[{"attributes":{"POSITION":0}}]}],
        "buffers":[{"byteLength":36,"uri":"tri.bin"}],
        "bufferViews":[{"buffer":0,"byteLength":36}],
        "accessors":[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3",
            "min":[0.0,0.0,0.0],"max":[3.0,3.0,0.0]}]}"#;
    (doc.as_bytes().to_vec(), bin)
}

#[tokio::test]
async fn test_remote_gltf_fetches_sibling_buffer() {
    let (doc, bin) = external_triangle();
    let (base, seen) = serve(vec![("/models/tri.gltf", doc), ("/models/tri.bin", bin)]).await;

    let model = ModelLoader::default()
        .load(&format!("{}/models/tri.gltf", base))
        .await
        .unwrap();

    assert_eq!(model.triangles.len(), 1);
    assert_eq!(model.compute_bounding_box().max, Vec3::new(3.0, 3.0, 0.0));
    assert!(seen.lock().unwrap().contains(&"/models/tri.bin".to_string()));
}

#[tokio::test]
async fn test_remote_missing_sibling_surfaces_http_error() {
    let (doc, _) = external_triangle();
    let (base, _) = serve(vec![("/models/tri.gltf", doc)]).await;

    let err = ModelLoader::default()
        .load(&format!("{}/models/tri.gltf", base))
        .await
        .unwrap_err();
    match err {
        LoadError::Http(e) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_not_found_surfaces_http_error() {
    let (base, _) = serve(Vec::new()).await;

    let err = ModelLoader::default()
        .load(&format!("{}/ship.glb", base))
        .await
        .unwrap_err();
    match err {
        LoadError::Http(e) => assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND)),
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_remote_obj_loads() {
    let body = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec();
    let (base, seen) = serve(vec![("/cube.obj", body)]).await;

    let model = ModelLoader::default()
        .load(&format!("{}/cube.obj?rev=2", base))
        .await
        .unwrap();

    assert_eq!(model.triangles.len(), 1);
    assert_eq!(seen.lock().unwrap().as_slice(), ["/cube.obj?rev=2".to_string()]);
}
