use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Sign a token over the given claims (HS256).
pub fn issue_token(claims: &JwtClaims, jwt_secret: &str) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let claims_json =
        serde_json::to_string(claims).map_err(|e| format!("Failed to encode claims: {}", e))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);
    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Verify signature and expiry, returning the raw claims. Used directly for
/// the short-lived verification/reset tokens whose claims carry a `purpose`.
pub fn decode_claims(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = chrono::Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    Ok(claims)
}

/// Validate a session token and build the caller identity from its claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    let claims = decode_claims(token, jwt_secret)?;

    if claims.purpose.is_some() {
        // Verification/reset tokens are not session tokens
        return Err("Token not valid for authentication".to_string());
    }

    let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid subject claim".to_string())?;

    let user = User {
        id,
        first_name: claims.first_name,
        last_name: claims.last_name,
        email: claims.email,
        phone_number: claims.phone_number,
        is_admin: claims.is_admin,
        is_verified: claims.is_verified,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
