//! NSS Key Log Format support (SSLKEYLOGFILE).
//!
//! Wireshark-compatible key logging for TLS debugging.
//! Line format: `<label> <client_random_hex> <secret_hex>`.

use crate::config::TlsConfig;

/// Convert bytes to lowercase hex.
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Emit one key log line through the config callback, if one is set.
pub fn log_key(config: &TlsConfig, label: &str, client_random: &[u8; 32], secret: &[u8]) {
    if let Some(cb) = &config.key_log_callback {
        let line = format!("{} {} {}", label, to_hex(client_random), to_hex(secret));
        cb(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_log_key_no_callback() {
        let config = TlsConfig::builder().build();
        // No callback set: must not panic
        log_key(&config, "CLIENT_HANDSHAKE_TRAFFIC_SECRET", &[0u8; 32], &[1, 2]);
    }

    #[test]
    fn test_nss_line_format() {
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let config = TlsConfig::builder()
            .key_log(Arc::new(move |line: &str| {
                sink.lock().unwrap().push(line.to_string());
            }))
            .build();

        log_key(
            &config,
            "SERVER_HANDSHAKE_TRAFFIC_SECRET",
            &[0x42; 32],
            &[0xAB, 0xCD],
        );

        let logged = lines.lock().unwrap();
        assert_eq!(logged.len(), 1);
        let parts: Vec<&str> = logged[0].split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "SERVER_HANDSHAKE_TRAFFIC_SECRET");
        assert_eq!(parts[1], "42".repeat(32));
        assert_eq!(parts[2], "abcd");
    }

    #[test]
    fn test_lines_emitted_in_order() {
        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let config = TlsConfig::builder()
            .key_log(Arc::new(move |line: &str| {
                sink.lock().unwrap().push(line.to_string());
            }))
            .build();

        log_key(&config, "CLIENT_TRAFFIC_SECRET_0", &[1; 32], &[0x10]);
        log_key(&config, "SERVER_TRAFFIC_SECRET_0", &[1; 32], &[0x20]);

        let logged = lines.lock().unwrap();
        assert!(logged[0].starts_with("CLIENT_TRAFFIC_SECRET_0 "));
        assert!(logged[1].starts_with("SERVER_TRAFFIC_SECRET_0 "));
    }
}
