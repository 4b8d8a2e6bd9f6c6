//! HMAC-SHA256 request signing for the Bitkub v3 API.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The string Bitkub expects to be signed: `timestamp + method + path + body`.
///
/// `path` includes any query string; `body` is empty for GET requests.
pub fn signature_payload(timestamp_ms: u64, method: &str, path: &str, body: &str) -> String {
    format!("{timestamp_ms}{method}{path}{body}")
}

/// Sign a payload with HMAC-SHA256.
///
/// Returns the hex-encoded signature for the `X-BTK-SIGN` header.
pub fn sign(payload: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_concatenation() {
        let payload = signature_payload(1699376552354, "POST", "/api/v3/market/wallet", "");
        assert_eq!(payload, "1699376552354POST/api/v3/market/wallet");
    }

    #[test]
    fn known_signature() {
        let payload = signature_payload(1699376552354, "POST", "/api/v3/market/wallet", "");
        assert_eq!(
            sign(&payload, "test-secret"),
            "032d9fef8d32d05b360b77ca5a32fd14a147a0980b08e40237e732841e983944"
        );
    }
}
