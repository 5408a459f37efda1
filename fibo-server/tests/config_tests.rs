// Configuration tests
// ServerConfig defaults, YAML loading and conversions

use fibo_server::ServerConfig;
use fibo_server::config::CacheBackendKind;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_default_values() {
    let config = ServerConfig::default();

    assert_eq!(config.http.addr(), "0.0.0.0:8080");
    assert_eq!(config.rpc.addr(), "0.0.0.0:8081");
    assert_eq!(config.http.timeout(), Duration::from_secs(10));
    assert_eq!(config.rpc.timeout(), Duration::from_secs(10));

    assert_eq!(config.cache.backend, CacheBackendKind::Redis);
    assert_eq!(config.cache.host, "localhost");
    assert_eq!(config.cache.port, 6379);
    assert_eq!(config.cache.expiration(), Duration::from_secs(12 * 60 * 60));
    assert_eq!(config.cache.max_failures, 6);

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_config_from_file() {
    let file = write_config(
        r#"
http:
  host: "127.0.0.1"
  port: 9000
  timeout_ms: 2500
rpc:
  port: 9001
cache:
  backend: memory
  expiration_secs: 60
  max_failures: 3
logging:
  level: "debug"
  format: "pretty"
"#,
    );

    let config = ServerConfig::from_file(file.path()).unwrap();

    assert_eq!(config.http.addr(), "127.0.0.1:9000");
    assert_eq!(config.http.timeout(), Duration::from_millis(2500));
    // Missing fields keep their defaults
    assert_eq!(config.rpc.addr(), "0.0.0.0:9001");
    assert_eq!(config.rpc.timeout(), Duration::from_secs(10));

    assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    assert_eq!(config.cache.port, 6379);

    let settings = config.to_cache_settings();
    assert_eq!(settings.ttl, Duration::from_secs(60));
    assert_eq!(settings.max_failures, 3);

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn test_partial_config_uses_defaults() {
    let file = write_config("cache:\n  host: \"redis.internal\"\n");

    let config = ServerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.cache.host, "redis.internal");
    assert_eq!(config.http.port, 8080);
    assert_eq!(config.rpc.port, 8081);
}

#[test]
fn test_zero_values_fall_back_to_defaults() {
    let file = write_config(
        r#"
http:
  timeout_ms: 0
cache:
  expiration_secs: 0
"#,
    );

    let config = ServerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.http.timeout(), Duration::from_secs(10));
    assert_eq!(config.cache.expiration(), Duration::from_secs(12 * 60 * 60));
}

#[test]
fn test_disabled_cache() {
    let file = write_config("cache:\n  backend: disabled\n");
    let config = ServerConfig::from_file(file.path()).unwrap();
    assert!(!config.cache.is_enabled());
    assert_eq!(config.to_cache_settings().max_failures, 0);

    let file = write_config("cache:\n  max_failures: 0\n");
    let config = ServerConfig::from_file(file.path()).unwrap();
    assert!(!config.cache.is_enabled());
}

#[test]
fn test_invalid_yaml() {
    let file = write_config("http: [not, a, mapping");
    assert!(ServerConfig::from_file(file.path()).is_err());

    let file = write_config("cache:\n  backend: memcached\n");
    assert!(ServerConfig::from_file(file.path()).is_err());
}

#[test]
fn test_nonexistent_file() {
    assert!(ServerConfig::from_file("/nonexistent/fibonacci.yml").is_err());
}
