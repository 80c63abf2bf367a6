use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use scene_ngin::{
    Node,
    codec::{ImportOptions, export_model},
    resources::{load_model, save_model, with_retry},
};

use crate::common::test_utils::{init_logger, triangle_mesh};

mod common;

#[tokio::test]
async fn retry_returns_the_first_success() {
    init_logger();
    let calls = AtomicUsize::new(0);

    let value = with_retry(5, Duration::from_millis(1), || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if n < 3 {
                Err(anyhow!("attempt {n} went wrong"))
            } else {
                Ok(n)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(value, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_gives_up_after_all_attempts() {
    let calls = AtomicUsize::new(0);

    let err = with_retry(4, Duration::from_millis(1), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(anyhow!("unreachable host")) }
    })
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.to_string(), "failed to fetch after 4 attempts");
}

#[tokio::test]
async fn saved_models_load_back() {
    let dir = std::env::temp_dir().join(format!("scene-ngin-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let root = Node::group("Desk Lamp").with_child(triangle_mesh("shade"));
    let model = export_model(&root).unwrap();

    let (gltf_path, bin_path) = save_model(&dir, root.name(), &model).await.unwrap();
    assert!(gltf_path.ends_with("Desk_Lamp.gltf"));

    let nodes = load_model(
        gltf_path.to_str().unwrap(),
        Some(bin_path.to_str().unwrap()),
        ImportOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].name(), "Desk Lamp");
    assert!(nodes[1].is_mesh());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn missing_files_are_reported_with_context() {
    let err = load_model("definitely/not/here.gltf", None, ImportOptions::default())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("definitely/not/here.gltf"));
}
