use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Checks that a payment callback was signed by the gateway.
///
/// Razorpay signs `"{order_id}|{payment_id}"` with HMAC-SHA256 keyed by the
/// key secret and sends the lowercase hex digest. A mismatch is an ordinary
/// `false`, never an error. The comparison is constant-time; a signature
/// that is not valid hex of the right length cannot match anything and is
/// rejected outright.
pub fn verify(order_id: &str, payment_id: &str, supplied_signature: &str, secret: &str) -> bool {
    let Ok(candidate) = hex::decode(supplied_signature) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_digest_computed_with_the_shared_secret() {
        let signature = sign("order_abc", "pay_xyz", "s3cret");
        assert!(verify("order_abc", "pay_xyz", &signature, "s3cret"));
    }

    #[test]
    fn rejects_digest_computed_with_a_different_secret() {
        let signature = sign("order_abc", "pay_xyz", "wrong_secret");
        assert!(!verify("order_abc", "pay_xyz", &signature, "s3cret"));
    }

    #[test]
    fn rejects_signature_for_a_different_payment() {
        let signature = sign("order_abc", "pay_other", "s3cret");
        assert!(!verify("order_abc", "pay_xyz", &signature, "s3cret"));
    }

    #[test]
    fn rejects_non_hex_and_empty_signatures() {
        assert!(!verify("order_abc", "pay_xyz", "not-a-valid-hex-signature", "s3cret"));
        assert!(!verify("order_abc", "pay_xyz", "", "s3cret"));
    }

    #[test]
    fn rejects_truncated_digest() {
        let signature = sign("order_abc", "pay_xyz", "s3cret");
        assert!(!verify("order_abc", "pay_xyz", &signature[..32], "s3cret"));
    }
}
