//! 配置与工厂集成测试
//!
//! 验证从配置文本到可用缓存链的完整装配路径。

use cacheron::config::CacheronConfig;
use cacheron::entry::SetOptions;
use cacheron::tiered::TieredCache;

#[tokio::test]
async fn test_assemble_chain_from_json() {
    let config = CacheronConfig::from_json_str(
        r#"{
            "layers": [
                {"backend": "memory", "name": "hot", "max_entries": 100},
                {"backend": "memory", "name": "warm"}
            ]
        }"#,
    )
    .unwrap();

    let cache = TieredCache::<String>::from_config(&config).await.unwrap();
    assert_eq!(cache.layers().len(), 2);
    assert_eq!(cache.layers()[0].name(), "hot");
    assert_eq!(cache.layers()[1].name(), "warm");

    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;
    assert_eq!(cache.get("k1").await, Some("v1".to_string()));
}

#[cfg(feature = "filesystem")]
#[tokio::test]
async fn test_assemble_mixed_chain_from_yaml() {
    let dir = tempfile::TempDir::new().unwrap();
    let yaml = format!(
        r#"
analytics_enabled: true
layers:
  - backend: memory
    max_entries: 10
  - backend: filesystem
    path: {}
"#,
        dir.path().display()
    );

    let config = CacheronConfig::from_yaml_str(&yaml).unwrap();
    let cache = TieredCache::<String>::from_config(&config).await.unwrap();
    assert_eq!(cache.layers().len(), 2);

    cache.set("k1", "v1".to_string(), &SetOptions::default()).await;
    // 两层都持有副本
    assert!(cache.layers()[0].layer().has("k1").await);
    assert!(cache.layers()[1].layer().has("k1").await);
}

#[tokio::test]
async fn test_config_file_roundtrip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cacheron.toml");
    std::fs::write(
        &path,
        r#"
analytics_enabled = false

[[layers]]
backend = "memory"
max_entries = 50
"#,
    )
    .unwrap();

    let config = CacheronConfig::from_file(&path).unwrap();
    assert!(!config.analytics_enabled);

    let cache = TieredCache::<String>::from_config(&config).await.unwrap();
    assert!(!cache.analytics_enabled());
}

#[tokio::test]
async fn test_analytics_flag_propagates_from_config() {
    let config = CacheronConfig::from_json_str(
        r#"{
            "analytics_enabled": false,
            "layers": [{"backend": "memory"}]
        }"#,
    )
    .unwrap();

    let cache = TieredCache::<String>::from_config(&config).await.unwrap();
    cache.get("missing").await;

    let stats = cache.stats().await;
    assert_eq!(stats.misses, 0);
}

#[tokio::test]
async fn test_invalid_config_rejected_before_assembly() {
    let config = CacheronConfig::from_json_str(
        r#"{"layers": [{"backend": "memory", "max_entries": 0}]}"#,
    )
    .unwrap();

    assert!(TieredCache::<String>::from_config(&config).await.is_err());
}
