//! Configuration files overlaid by flags

#[cfg(test)]
mod tests {
    use pc_metrics::config::{AgentArgs, ServerArgs};
    use pc_metrics::storage::StorageKind;
    use pc_metrics::{AgentConfig, ServerConfig};
    use std::time::Duration;

    #[tokio::test]
    async fn test_server_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        std::fs::write(
            &path,
            "address: 0.0.0.0:9090\nstore_interval: 0\nfile_storage_path: /tmp/m.json\nrestore: false\nkey: from-file\n",
        )
        .unwrap();

        let args = ServerArgs {
            config: Some(path),
            key: Some("from-flag".to_string()),
            ..ServerArgs::default()
        };
        let config = ServerConfig::load(args).await.unwrap();

        assert_eq!(config.address, "0.0.0.0:9090");
        assert_eq!(config.key.as_deref(), Some("from-flag"));
        assert_eq!(config.store_interval(), Duration::from_secs(1));
        assert_eq!(config.storage.resolved_kind(), StorageKind::Disk);
        assert!(!config.storage.restore);
    }

    #[tokio::test]
    async fn test_agent_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");
        std::fs::write(
            &path,
            r#"{"address":"collector:8080","poll_interval":1,"report_interval":4,"rate_limit":2}"#,
        )
        .unwrap();

        let args = AgentArgs {
            config: Some(path),
            ..AgentArgs::default()
        };
        let config = AgentConfig::load(args).await.unwrap();

        assert_eq!(config.report_interval(), Duration::from_secs(4));
        assert_eq!(config.rate_limit, 2);
        assert_eq!(config.updates_url(), "http://collector:8080/updates/");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_config_error() {
        let args = ServerArgs {
            config: Some("/nonexistent/server.yaml".into()),
            ..ServerArgs::default()
        };
        let err = ServerConfig::load(args).await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("config"));
    }
}
