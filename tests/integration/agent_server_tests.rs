//! Agent reporter pushing to a running server

#[cfg(test)]
mod tests {
    use crate::common::TestServer;
    use crate::common::fixtures::rsa_key;
    use pc_metrics::agent::{MetricsCollector, POLL_COUNT, Reporter, RuntimeSampler, report_once};
    use pc_metrics::storage::MemoryStorage;
    use pc_metrics::{AgentConfig, Envelope, MetricsEngine, ServerConfig};
    use rsa::RsaPublicKey;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct FixedSampler;

    impl RuntimeSampler for FixedSampler {
        fn sample(&mut self) -> BTreeMap<String, f64> {
            BTreeMap::from([
                ("Alloc".to_string(), 4096.0),
                ("RandomValue".to_string(), 0.25),
            ])
        }
    }

    fn start_server(config: ServerConfig, envelope: Envelope) -> TestServer {
        let engine = Arc::new(MetricsEngine::new(Arc::new(MemoryStorage::new())));
        TestServer::start(config, engine, envelope)
    }

    fn reporter_for(server: &TestServer, envelope: Envelope) -> Reporter {
        let config = AgentConfig {
            address: server.address().to_string(),
            ..AgentConfig::default()
        };
        Reporter::new(&config, envelope).unwrap()
    }

    fn polled(times: usize) -> MetricsCollector {
        let collector = MetricsCollector::new(FixedSampler);
        for _ in 0..times {
            collector.poll();
        }
        collector
    }

    #[tokio::test]
    async fn test_reports_accumulate_on_server() {
        let server = start_server(ServerConfig::default(), Envelope::new());
        let reporter = reporter_for(&server, Envelope::new());
        let collector = polled(2);

        report_once(&collector, &reporter).await.unwrap();
        collector.poll();
        report_once(&collector, &reporter).await.unwrap();

        assert_eq!(server.engine.get_counter(POLL_COUNT).await.unwrap(), 3);
        assert_eq!(server.engine.get_gauge("Alloc").await.unwrap(), 4096.0);

        let body = reqwest::get(server.url("/value/counter/PollCount"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "3");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_signed_reports() {
        let server = start_server(ServerConfig::default(), Envelope::new().with_key("secret"));

        let good = reporter_for(&server, Envelope::new().with_key("secret"));
        let collector = polled(1);
        report_once(&collector, &good).await.unwrap();
        assert_eq!(server.engine.get_counter(POLL_COUNT).await.unwrap(), 1);

        let bad = reporter_for(&server, Envelope::new().with_key("guess"));
        let collector = polled(2);
        assert!(report_once(&collector, &bad).await.is_err());
        assert_eq!(collector.pending(POLL_COUNT), 2);
        assert_eq!(server.engine.get_counter(POLL_COUNT).await.unwrap(), 1);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_encrypted_reports() {
        let private = rsa_key().clone();
        let public = RsaPublicKey::from(&private);
        let server = start_server(
            ServerConfig::default(),
            Envelope::new().with_private_key(private),
        );

        let plain = reporter_for(&server, Envelope::new());
        assert!(report_once(&polled(1), &plain).await.is_err());

        let encrypting = reporter_for(&server, Envelope::new().with_public_key(public));
        report_once(&polled(4), &encrypting).await.unwrap();
        assert_eq!(server.engine.get_counter(POLL_COUNT).await.unwrap(), 4);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_trusted_subnet_checks_real_ip() {
        let config = ServerConfig {
            trusted_subnet: Some("10.0.0.0/8".parse().unwrap()),
            ..ServerConfig::default()
        };
        let server = start_server(config, Envelope::new());

        let outside = reporter_for(&server, Envelope::new())
            .with_real_ip(Some("192.168.0.1".parse().unwrap()));
        assert!(report_once(&polled(1), &outside).await.is_err());

        let inside = reporter_for(&server, Envelope::new())
            .with_real_ip(Some("10.1.2.3".parse().unwrap()));
        report_once(&polled(1), &inside).await.unwrap();
        assert_eq!(server.engine.get_counter(POLL_COUNT).await.unwrap(), 1);

        server.stop().await;
    }
}
