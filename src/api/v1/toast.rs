use hmac::{Hmac, KeyInit, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Danger,
}

impl ToastKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(ToastKind::Success),
            "danger" => Some(ToastKind::Danger),
            _ => None,
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastKind::Success => write!(f, "success"),
            ToastKind::Danger => write!(f, "danger"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

/// Toast parameters as they arrive on a redirect target.
#[derive(Debug, Default, Deserialize)]
pub struct ToastQuery {
    #[serde(rename = "toast-message")]
    pub message: Option<String>,
    #[serde(rename = "toast-type")]
    pub kind: Option<String>,
    #[serde(rename = "hash-value")]
    pub hash: Option<String>,
}

/// Signs toast parameters so a page only shows messages the server put in
/// the redirect URL.
#[derive(Clone)]
pub struct ToastSigner {
    mac: HmacSha256,
}

impl fmt::Debug for ToastSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ToastSigner { .. }")
    }
}

impl ToastSigner {
    pub fn try_new(secret: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())?;
        Ok(ToastSigner { mac })
    }

    fn mac(&self, message: &str, kind: ToastKind) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        mac.update(b"|");
        mac.update(kind.to_string().as_bytes());
        mac
    }

    pub fn sign(&self, message: &str, kind: ToastKind) -> String {
        hex::encode(self.mac(message, kind).finalize().into_bytes())
    }

    pub fn verify(&self, message: &str, kind: ToastKind, hash_hex: &str) -> bool {
        let Ok(hash) = hex::decode(hash_hex) else {
            return false;
        };
        self.mac(message, kind).verify_slice(&hash).is_ok()
    }

    /// `base?toast-message=..&toast-type=..&hash-value=..`. Messages are
    /// URL-safe slugs.
    pub fn redirect_url(&self, base: &str, message: &str, kind: ToastKind) -> String {
        format!(
            "{}?toast-message={}&toast-type={}&hash-value={}",
            base,
            message,
            kind,
            self.sign(message, kind)
        )
    }

    /// The toast carried by `query`, if its hash checks out.
    pub fn verified(&self, query: &ToastQuery) -> Option<Toast> {
        let message = query.message.as_ref()?;
        let kind = ToastKind::parse(query.kind.as_deref()?)?;
        let hash = query.hash.as_ref()?;
        if !self.verify(message, kind, hash) {
            return None;
        }
        Some(Toast {
            message: message.clone(),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_toast_verifies() {
        let signer = ToastSigner::try_new("toast-secret").unwrap();
        let url = signer.redirect_url("/", "login-successfully", ToastKind::Success);
        assert!(url.starts_with(
            "/?toast-message=login-successfully&toast-type=success&hash-value="
        ));

        let hash = signer.sign("login-successfully", ToastKind::Success);
        let query = ToastQuery {
            message: Some("login-successfully".into()),
            kind: Some("success".into()),
            hash: Some(hash.clone()),
        };
        assert_eq!(
            signer.verified(&query),
            Some(Toast {
                message: "login-successfully".into(),
                kind: ToastKind::Success
            })
        );
        assert!(!signer.verify("login-successfully", ToastKind::Danger, &hash));
        let other = ToastSigner::try_new("other").unwrap();
        assert!(!other.verify("login-successfully", ToastKind::Success, &hash));
    }

    #[test]
    fn tampered_or_partial_query_is_ignored() {
        let signer = ToastSigner::try_new("toast-secret").unwrap();
        let query = ToastQuery {
            message: Some("you-won-a-prize".into()),
            kind: Some("success".into()),
            hash: Some("zz".into()),
        };
        assert_eq!(signer.verified(&query), None);
        assert_eq!(signer.verified(&ToastQuery::default()), None);
    }
}
