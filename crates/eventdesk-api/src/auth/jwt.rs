/// JWT validation using the user pool's JWKS
use super::TokenVerifier;
use eventdesk_core::auth::Principal;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claims of a Cognito ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Email address of the user
    #[serde(default)]
    pub email: String,

    /// User pool groups
    #[serde(rename = "cognito:groups", default)]
    pub groups: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: usize,

    /// Issuer
    pub iss: String,
}

/// JWKS Key structure
#[derive(Debug, Deserialize)]
pub struct JwksKey {
    pub kty: String,
    pub kid: String,
    pub n: String,
    pub e: String,
}

/// JWKS structure
#[derive(Debug, Deserialize)]
pub struct Jwks {
    pub keys: Vec<JwksKey>,
}

/// Verifies RS256 tokens against a JWKS and an expected issuer
pub struct JwksVerifier {
    /// JWKS keys mapped by kid
    keys: HashMap<String, DecodingKey>,
    issuer: String,
}

impl JwksVerifier {
    /// Create a new verifier from JWKS JSON
    pub fn new(jwks_json: &str, issuer: impl Into<String>) -> Result<Self, String> {
        let jwks: Jwks =
            serde_json::from_str(jwks_json).map_err(|e| format!("Invalid JWKS JSON: {}", e))?;

        let mut keys = HashMap::new();

        for key in jwks.keys {
            if key.kty == "RSA" {
                let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e)
                    .map_err(|e| format!("Failed to create decoding key: {}", e))?;

                keys.insert(key.kid.clone(), decoding_key);
            }
        }

        if keys.is_empty() {
            return Err("No valid RSA keys found in JWKS".to_string());
        }

        Ok(Self {
            keys,
            issuer: issuer.into(),
        })
    }

    /// Validate a JWT token and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims, String> {
        let header =
            decode_header(token).map_err(|e| format!("Failed to decode JWT header: {}", e))?;

        let kid = header
            .kid
            .ok_or_else(|| "JWT header missing 'kid' field".to_string())?;

        let decoding_key = self
            .keys
            .get(&kid)
            .ok_or_else(|| format!("No JWKS key found for kid: {}", kid))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        // ID tokens carry the app client id as audience; the issuer pins the user pool
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data = decode::<Claims>(token, decoding_key, &validation)
            .map_err(|e| format!("Failed to validate JWT: {}", e))?;

        Ok(token_data.claims)
    }
}

impl TokenVerifier for JwksVerifier {
    fn verify(&self, token: &str) -> Result<Principal, String> {
        let claims = self.validate(token)?;
        Ok(Principal::new(claims.sub, claims.email, claims.groups))
    }
}
