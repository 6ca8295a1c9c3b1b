//! Sealing and opening with keys loaded from PEM files

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{mixed_batch, write_key_pair};
    use pc_metrics::transport::encryption::{load_private_key, load_public_key};
    use pc_metrics::{Envelope, Metric, MetricsError};

    #[tokio::test]
    async fn test_encrypted_batch_round_trip_through_key_files() {
        let dir = tempfile::tempdir().unwrap();
        let (private_path, public_path) = write_key_pair(dir.path());

        let sender = Envelope::new().with_public_key(load_public_key(&public_path).await.unwrap());
        let receiver =
            Envelope::new().with_private_key(load_private_key(&private_path).await.unwrap());

        let sealed = sender.seal(&mixed_batch()).unwrap();
        assert!(sealed.signature.is_none());
        assert!(sealed.content_encoding.is_none());
        assert_eq!(receiver.unseal(&sealed).unwrap(), mixed_batch());
    }

    #[tokio::test]
    async fn test_certificate_key_file_encrypts_for_its_private_key() {
        let testdata = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("src/transport/testdata");

        let sender = Envelope::new()
            .with_public_key(load_public_key(&testdata.join("cert.pem")).await.unwrap());
        let receiver = Envelope::new()
            .with_private_key(load_private_key(&testdata.join("key.pem")).await.unwrap());

        let sealed = sender.seal(&mixed_batch()).unwrap();
        assert_eq!(receiver.unseal(&sealed).unwrap(), mixed_batch());
    }

    #[tokio::test]
    async fn test_plain_batch_is_refused_by_encrypting_receiver() {
        let dir = tempfile::tempdir().unwrap();
        let (private_path, _) = write_key_pair(dir.path());

        let receiver =
            Envelope::new().with_private_key(load_private_key(&private_path).await.unwrap());
        let sealed = Envelope::new().seal(&mixed_batch()).unwrap();

        let err = receiver.unseal(&sealed).unwrap_err();
        assert!(matches!(err, MetricsError::Crypto(_)));
    }

    #[tokio::test]
    async fn test_wrong_key_is_an_integrity_error() {
        let sealed = Envelope::new()
            .with_key("one")
            .seal(&[Metric::counter("PollCount", 1)])
            .unwrap();

        let err = Envelope::new().with_key("two").unseal(&sealed).unwrap_err();
        assert!(matches!(err, MetricsError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_missing_key_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pem");
        assert!(load_public_key(&missing).await.is_err());
        assert!(load_private_key(&missing).await.is_err());
    }
}
