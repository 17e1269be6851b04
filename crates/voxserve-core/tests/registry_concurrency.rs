//! Concurrency tests for the voice registry's single-flight load guarantee.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use voxserve_core::{voice_name, VoiceRegistry, VoxError};

fn touch_model(dir: &Path, model: &str) {
    fs::write(voice_name::model_path(dir, model), b"onnx-bytes").unwrap();
}

#[tokio::test]
async fn concurrent_loads_share_one_instance() {
    let dir = TempDir::new().unwrap();
    let model = "en_US-lessac-high";
    touch_model(dir.path(), model);
    let registry = Arc::new(VoiceRegistry::new(dir.path()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_or_load(model).await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap().expect("load should succeed"));
    }

    // All callers observe the same cached instance, produced by exactly
    // one underlying load
    let first = &handles[0];
    assert!(handles.iter().all(|h| Arc::ptr_eq(first, h)));
    assert_eq!(registry.loads_started(), 1);
    assert_eq!(registry.loaded_count(), 1);
}

#[tokio::test]
async fn concurrent_failures_leave_no_entry() {
    let dir = TempDir::new().unwrap();
    let model = "en_US-lessac-high";
    // Empty artifact: present on disk but fails to instantiate
    fs::write(voice_name::model_path(dir.path(), model), b"").unwrap();
    let registry = Arc::new(VoiceRegistry::new(dir.path()));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_or_load(model).await })
        })
        .collect();

    for task in tasks {
        let err = task.await.unwrap().expect_err("load should fail");
        assert!(matches!(err, VoxError::LoadFailed { .. }));
    }

    // The cache holds nothing for the model; a repaired artifact loads
    assert!(!registry.is_loaded(model));
    assert_eq!(registry.loaded_count(), 0);
    touch_model(dir.path(), model);
    registry.get_or_load(model).await.unwrap();
    assert!(registry.is_loaded(model));
}

#[tokio::test]
async fn loads_for_different_models_proceed_independently() {
    let dir = TempDir::new().unwrap();
    let models = ["en_US-amy-medium", "en_GB-alan-medium", "de_DE-thorsten-low"];
    for model in models {
        touch_model(dir.path(), model);
    }
    let registry = Arc::new(VoiceRegistry::new(dir.path()));

    let tasks: Vec<_> = models
        .into_iter()
        .map(|model| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_or_load(model).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(registry.loaded_count(), 3);
    for model in models {
        assert!(registry.is_loaded(model));
    }
}

#[tokio::test]
async fn eviction_races_load_without_caching_stale_handle() {
    let dir = TempDir::new().unwrap();
    let model = "en_US-amy-medium";
    touch_model(dir.path(), model);
    let registry = Arc::new(VoiceRegistry::new(dir.path()));

    // Interleave loads and evictions; whatever the timing, an eviction
    // either waits out the load or removes the cached handle, and the
    // registry stays usable afterwards.
    for _ in 0..10 {
        let loader = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_or_load(model).await })
        };
        let evictor = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.evict(model).await })
        };
        loader.await.unwrap().unwrap();
        evictor.await.unwrap();
    }

    registry.evict(model).await;
    assert!(!registry.is_loaded(model));
    registry.get_or_load(model).await.unwrap();
    assert!(registry.is_loaded(model));
}
