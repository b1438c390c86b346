use super::*;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.youtube.api_url, "https://www.googleapis.com/youtube/v3/");
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.server.bind_address(), "127.0.0.1:5000");
    assert_eq!(config.store.table_name, "videos");
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.server.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.store.table_name = "videos; drop".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.youtube.api_url = "not a url".to_string();
    assert!(invalid_config.validate().is_err());
}

#[test]
fn api_base_url_gets_trailing_slash() {
    let youtube = YoutubeConfig {
        api_url: "http://127.0.0.1:9000/youtube/v3".to_string(),
        ..YoutubeConfig::default()
    };
    let url = youtube
        .api_base_url()
        .expect("should parse api url successfully");
    assert_eq!(url.as_str(), "http://127.0.0.1:9000/youtube/v3/");
    assert_eq!(
        url.join("search").expect("should join").as_str(),
        "http://127.0.0.1:9000/youtube/v3/search"
    );
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn api_key_from_lookup() {
    let key = ApiKey::from_lookup(|name| {
        assert_eq!(name, YOUTUBE_API_KEY_VAR);
        Some("  secret-key  ".to_string())
    })
    .expect("should read api key");
    assert_eq!(key.as_str(), "secret-key");
    assert_eq!(format!("{:?}", key), "ApiKey(<redacted>)");
}

#[test]
fn api_key_missing_or_blank() {
    let missing = ApiKey::from_lookup(|_| None);
    assert!(matches!(missing, Err(ConfigError::MissingApiKey(_))));

    let blank = ApiKey::from_lookup(|_| Some("   ".to_string()));
    let err = blank.expect_err("blank key should be rejected");
    assert_eq!(err.to_string(), "YOUTUBE_API_KEY is not set in the environment");
}

#[test]
fn request_timeouts() {
    let mut config = Config::default();
    assert_eq!(config.youtube.timeout().expect("should be valid"), None);
    assert_eq!(config.ollama.timeout().expect("should be valid"), None);

    config.youtube.timeout_secs = Some(15);
    config.ollama.timeout_secs = Some(30);
    assert_eq!(
        config.youtube.timeout().expect("should be valid"),
        Some(Duration::from_secs(15))
    );
    assert_eq!(
        config.ollama.timeout().expect("should be valid"),
        Some(Duration::from_secs(30))
    );
    assert!(config.validate().is_ok());

    config.ollama.timeout_secs = Some(0);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidTimeout(0))
    ));
}
