/*
 * session.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::str::FromStr;

use hmac::Hmac;
use hmac::KeyInit;
use hmac::Mac;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;
use strum::IntoEnumIterator;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;
use uuid::Uuid;

use crate::error::Error;

/// The keyed digest schemes a connection file may name in its
/// `signature_scheme` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
pub enum SignatureScheme {
    #[strum(serialize = "hmac-sha256")]
    HmacSha256,
    #[strum(serialize = "hmac-sha384")]
    HmacSha384,
    #[strum(serialize = "hmac-sha512")]
    HmacSha512,
}

impl SignatureScheme {
    /// Comma-separated names of every supported scheme, for diagnostics
    pub fn supported() -> String {
        SignatureScheme::iter()
            .map(|scheme| scheme.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// What to do with an inbound message whose signature doesn't match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Drop the message without replying.
    #[default]
    Enforce,

    /// Log the mismatch and process the message anyway. Compatibility shim for
    /// frontends that sign with a stale or mangled key.
    Permissive,
}

/// Computes and checks message signatures. An empty key disables signing
/// altogether, as permitted by the Jupyter protocol.
#[derive(Clone)]
pub enum Signer {
    Unsigned,
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl Signer {
    pub fn new(key: &str, scheme: SignatureScheme) -> Result<Self, Error> {
        if key.is_empty() {
            return Ok(Signer::Unsigned);
        }
        let invalid = |err| Error::HmacKeyInvalid(String::from(key), err);
        let signer = match scheme {
            SignatureScheme::HmacSha256 => Signer::Sha256(
                <Hmac<Sha256> as KeyInit>::new_from_slice(key.as_bytes()).map_err(invalid)?,
            ),
            SignatureScheme::HmacSha384 => Signer::Sha384(
                <Hmac<Sha384> as KeyInit>::new_from_slice(key.as_bytes()).map_err(invalid)?,
            ),
            SignatureScheme::HmacSha512 => Signer::Sha512(
                <Hmac<Sha512> as KeyInit>::new_from_slice(key.as_bytes()).map_err(invalid)?,
            ),
        };
        Ok(signer)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(self, Signer::Unsigned)
    }

    /// Signs the given parts, fed to the digest in order. Returns the
    /// lowercase hex digest, or an empty string when unsigned.
    pub fn sign<P: AsRef<[u8]>>(&self, parts: &[P]) -> String {
        match self {
            Signer::Unsigned => String::new(),
            Signer::Sha256(mac) => hex::encode(digest(mac, parts)),
            Signer::Sha384(mac) => hex::encode(digest(mac, parts)),
            Signer::Sha512(mac) => hex::encode(digest(mac, parts)),
        }
    }

    /// Checks `signature` (hex text as received on the wire) against the
    /// digest of `parts`. The comparison is constant time.
    pub fn verify<P: AsRef<[u8]>>(&self, parts: &[P], signature: &[u8]) -> bool {
        let Ok(decoded) = hex::decode(signature) else {
            return self.is_unsigned();
        };
        match self {
            Signer::Unsigned => true,
            Signer::Sha256(mac) => check(mac, parts, &decoded),
            Signer::Sha384(mac) => check(mac, parts, &decoded),
            Signer::Sha512(mac) => check(mac, parts, &decoded),
        }
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        let scheme = match self {
            Signer::Unsigned => "unsigned",
            Signer::Sha256(_) => "hmac-sha256",
            Signer::Sha384(_) => "hmac-sha384",
            Signer::Sha512(_) => "hmac-sha512",
        };
        write!(f, "Signer({scheme})")
    }
}

fn digest<M: Mac + Clone, P: AsRef<[u8]>>(mac: &M, parts: &[P]) -> Vec<u8> {
    let mut mac = mac.clone();
    for part in parts {
        mac.update(part.as_ref());
    }
    mac.finalize().into_bytes().to_vec()
}

fn check<M: Mac + Clone, P: AsRef<[u8]>>(mac: &M, parts: &[P], expected: &[u8]) -> bool {
    let mut mac = mac.clone();
    for part in parts {
        mac.update(part.as_ref());
    }
    mac.verify_slice(expected).is_ok()
}

/// Identity of this kernel process: the signer shared by every socket, the
/// policy applied to bad signatures, and the session/user names stamped on
/// messages the kernel originates.
#[derive(Clone, Debug)]
pub struct Session {
    pub signer: Signer,
    pub policy: SignaturePolicy,
    pub username: String,
    pub session_id: String,
}

impl Session {
    pub fn create(key: &str, scheme: &str, policy: SignaturePolicy) -> Result<Self, Error> {
        let scheme = SignatureScheme::from_str(scheme)
            .map_err(|_| Error::UnsupportedSignatureScheme(String::from(scheme)))?;
        Ok(Self {
            signer: Signer::new(key, scheme)?,
            policy,
            session_id: Uuid::new_v4().to_string(),
            username: String::from("kernel"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> Vec<Vec<u8>> {
        vec![
            br#"{"msg_id":"a","msg_type":"kernel_info_request"}"#.to_vec(),
            b"{}".to_vec(),
            b"{}".to_vec(),
            br#"{"code":"1+1"}"#.to_vec(),
        ]
    }

    #[test]
    fn test_sign_matches_reference_digest() {
        // Reference value from RFC 4231, test case 2
        let signer = Signer::new("Jefe", SignatureScheme::HmacSha256).unwrap();
        let signature = signer.sign(&[b"what do ya want ".as_slice(), b"for nothing?"]);
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_then_verify() {
        for scheme in SignatureScheme::iter() {
            let session =
                Session::create("secret", &scheme.to_string(), SignaturePolicy::Enforce).unwrap();
            let signature = session.signer.sign(&parts());
            assert!(session.signer.verify(&parts(), signature.as_bytes()));
        }
    }

    #[test]
    fn test_any_single_byte_mutation_fails_verification() {
        let signer = Signer::new("secret", SignatureScheme::HmacSha256).unwrap();
        let signature = signer.sign(&parts());

        let original = parts();
        for (i, part) in original.iter().enumerate() {
            for j in 0..part.len() {
                let mut mutated = original.clone();
                mutated[i][j] ^= 0x01;
                assert!(!signer.verify(&mutated, signature.as_bytes()));
            }
        }
    }

    #[test]
    fn test_part_order_matters() {
        let signer = Signer::new("secret", SignatureScheme::HmacSha256).unwrap();
        let signature = signer.sign(&parts());

        let mut swapped = parts();
        swapped.swap(0, 3);
        assert!(!signer.verify(&swapped, signature.as_bytes()));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let signer = Signer::new("secret", SignatureScheme::HmacSha256).unwrap();
        let other = Signer::new("other", SignatureScheme::HmacSha256).unwrap();
        let signature = other.sign(&parts());
        assert!(!signer.verify(&parts(), signature.as_bytes()));
        assert!(!signer.verify(&parts(), b"not hex"));
    }

    #[test]
    fn test_empty_key_is_unsigned() {
        let session = Session::create("", "hmac-sha256", SignaturePolicy::Enforce).unwrap();
        assert!(session.signer.is_unsigned());
        assert_eq!(session.signer.sign(&parts()), "");
        assert!(session.signer.verify(&parts(), b""));
    }

    #[test]
    fn test_unknown_scheme_is_rejected() {
        let result = Session::create("secret", "hmac-md5", SignaturePolicy::Enforce);
        assert!(matches!(
            result,
            Err(Error::UnsupportedSignatureScheme(scheme)) if scheme == "hmac-md5"
        ));
    }

    #[test]
    fn test_supported_schemes() {
        assert_eq!(
            SignatureScheme::supported(),
            "hmac-sha256, hmac-sha384, hmac-sha512"
        );
    }
}
