use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "playreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn key() -> CacheKey {
    CacheKey::from_url("https://youtube.com/watch?v=abcdEFGH123").unwrap()
}

#[test]
fn staged_artifact_is_invisible_until_commit() {
    let dir = temp_dir("cache_stage");
    let cache = ArtifactCache::open(&dir, CachePolicy::Verify).unwrap();
    let k = key();

    let staged = cache.store_path(&k, "f32le");
    assert!(staged.to_string_lossy().ends_with(".f32le.partial"));
    std::fs::write(&staged, b"pcm-bytes").unwrap();
    assert_eq!(cache.lookup(&k, "f32le", "pcm"), None);

    let published = cache.commit(&k, "f32le", "pcm").unwrap();
    assert_eq!(published, dir.join("abcdEFGH123.f32le"));
    assert!(!staged.exists());
    assert_eq!(cache.lookup(&k, "f32le", "pcm"), Some(published.clone()));

    let sidecar: Sidecar = serde_json::from_slice(
        &std::fs::read(dir.join("abcdEFGH123.f32le.meta.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(sidecar.bytes, 9);
    assert_eq!(sidecar.tag, "pcm");
    assert_eq!(sidecar.key_fingerprint, k.fingerprint());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn verify_policy_rejects_tampered_or_retagged_artifacts() {
    let dir = temp_dir("cache_verify");
    let cache = ArtifactCache::open(&dir, CachePolicy::Verify).unwrap();
    let k = key();

    std::fs::write(cache.store_path(&k, "mp4"), b"video").unwrap();
    let path = cache.commit(&k, "mp4", "style-a").unwrap();

    assert_eq!(cache.lookup(&k, "mp4", "style-b"), None);

    std::fs::write(&path, b"videX").unwrap();
    assert_eq!(cache.lookup(&k, "mp4", "style-a"), None);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn trust_filename_accepts_files_without_sidecar() {
    let dir = temp_dir("cache_trust");
    let k = key();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(k.file_name("mp3")), b"legacy").unwrap();

    let trusting = ArtifactCache::open(&dir, CachePolicy::TrustFilename).unwrap();
    assert!(trusting.lookup(&k, "mp3", "anything").is_some());

    let verifying = ArtifactCache::open(&dir, CachePolicy::Verify).unwrap();
    assert_eq!(verifying.lookup(&k, "mp3", "anything"), None);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn commit_without_staged_file_is_a_cache_error() {
    let dir = temp_dir("cache_nostage");
    let cache = ArtifactCache::open(&dir, CachePolicy::Verify).unwrap();
    let err = cache.commit(&key(), "mp4", "t").unwrap_err();
    assert!(matches!(err, ReelError::Cache(_)));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn new_defers_directory_creation() {
    let dir = temp_dir("cache_lazy");
    let cache = ArtifactCache::new(&dir, CachePolicy::Verify);
    assert!(!dir.exists());
    assert_eq!(cache.lookup(&key(), "f32le", "pcm"), None);
    assert!(!dir.exists());

    cache.create_root().unwrap();
    assert!(dir.is_dir());
    std::fs::remove_dir_all(&dir).ok();
}
