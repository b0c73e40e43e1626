//! Credential checking for the demo gateway.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use relay_endpoint::{fail_with_code, ApiRequest, Authenticator, EndpointError};

/// Authenticates requests against a single service token.
///
/// Accepts `Authorization: Bearer <token>` where the token's SHA-256 digest
/// matches the configured digest, or `Authorization: Basic <base64>` carrying
/// `<user>:<token>` credentials. A wrong token is a 403; a missing or
/// malformed header is left to the pipeline's 401 normalization.
pub struct TokenAuthenticator {
    token_digest: [u8; 32],
}

impl TokenAuthenticator {
    /// Authenticator accepting tokens whose SHA-256 digest equals
    /// `token_digest`. The cleartext token never needs to reach the process.
    #[must_use]
    pub fn new(token_digest: [u8; 32]) -> Self {
        Self { token_digest }
    }

    /// Authenticator accepting exactly `token`.
    #[must_use]
    pub fn for_token(token: &str) -> Self {
        Self::new(digest(token))
    }

    fn check(&self, token: &str, subject: &str) -> Result<Value, EndpointError> {
        if digest(token) == self.token_digest {
            Ok(json!({ "subject": subject }))
        } else {
            Err(fail_with_code(403, "token rejected").into())
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, req: &ApiRequest) -> Result<Value, EndpointError> {
        let Some(authorization) = req.header_str(http::header::AUTHORIZATION) else {
            return Err(EndpointError::internal("missing authorization header"));
        };
        if let Some(token) = authorization.strip_prefix("Bearer ") {
            self.check(token.trim(), "bearer")
        } else if let Some(encoded) = authorization.strip_prefix("Basic ") {
            let decoded = STANDARD
                .decode(encoded.trim())
                .map_err(|_| EndpointError::internal("malformed basic credentials"))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|_| EndpointError::internal("malformed basic credentials"))?;
            let Some((user, token)) = decoded.split_once(':') else {
                return Err(EndpointError::internal("malformed basic credentials"));
            };
            self.check(token, user)
        } else {
            Err(EndpointError::internal("unsupported authorization scheme"))
        }
    }
}
