use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use std::fmt;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("cannot read private key {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("private key is neither PKCS#1 nor PKCS#8 RSA PEM")]
    Parse,
    #[error("cannot derive public key: {0}")]
    Derive(String),
}

/// RSA key pair used for every token. Built once at startup and shared
/// read-only afterwards.
pub struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeys { .. }")
    }
}

impl SigningKeys {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyMaterialError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|source| KeyMaterialError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    pub fn from_pem(private_pem: &str) -> Result<Self, KeyMaterialError> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(private_pem))
            .map_err(|_| KeyMaterialError::Parse)?;

        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyMaterialError::Derive(e.to_string()))?;

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|_| KeyMaterialError::Parse)?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| KeyMaterialError::Derive(e.to_string()))?;

        Ok(SigningKeys { encoding, decoding })
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}
