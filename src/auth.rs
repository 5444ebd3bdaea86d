use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use sha2::{Digest, Sha256};

const ADMIN_COOKIE: &str = "ano_admin";

// ── Client IP request guard ──

/// Real client IP, honouring common reverse-proxy headers in priority order:
/// CF-Connecting-IP, True-Client-IP, X-Real-IP, first X-Forwarded-For entry,
/// then the socket peer address.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();

        for name in ["CF-Connecting-IP", "True-Client-IP", "X-Real-IP"] {
            if let Some(ip) = headers.get_one(name) {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }

        // X-Forwarded-For: client, proxy1, proxy2
        if let Some(forwarded) = headers.get_one("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Outcome::Success(ClientIp(ip.to_string()));
                }
            }
        }

        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

// ── Admin session guard ──

/// Guard: the encrypted login flag is present.
pub struct AdminSession;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.cookies().get_private(ADMIN_COOKIE) {
            Some(c) if c.value() == "true" => Outcome::Success(AdminSession),
            Some(_) => {
                request.cookies().remove_private(Cookie::from(ADMIN_COOKIE));
                Outcome::Forward(Status::Unauthorized)
            }
            None => Outcome::Forward(Status::Unauthorized),
        }
    }
}

/// bcrypt hash of the admin password, held in managed state.
pub struct AdminPassword {
    hash: String,
}

impl AdminPassword {
    /// Accepts either a bcrypt hash (`$2...`) or a plain password, which is hashed here.
    pub fn from_config(configured: &str, cost: u32) -> Result<Self, String> {
        let hash = if configured.starts_with("$2") {
            configured.to_string()
        } else {
            bcrypt::hash(configured, cost).map_err(|e| e.to_string())?
        };
        Ok(AdminPassword { hash })
    }

    pub fn verify(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.hash).unwrap_or(false)
    }
}

pub fn set_admin_cookie(cookies: &CookieJar<'_>) {
    let mut cookie = Cookie::new(ADMIN_COOKIE, "true");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookies.add_private(cookie);
}

pub fn clear_admin_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::from(ADMIN_COOKIE));
}

pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_password_is_hashed() {
        let pw = AdminPassword::from_config("ano123", 4).unwrap();
        assert!(pw.hash.starts_with("$2"));
        assert!(pw.verify("ano123"));
        assert!(!pw.verify("ano124"));
        assert!(!pw.verify(""));
    }

    #[test]
    fn prehashed_password_is_kept() {
        let hash = bcrypt::hash("secret", 4).unwrap();
        let pw = AdminPassword::from_config(&hash, 4).unwrap();
        assert_eq!(pw.hash, hash);
        assert!(pw.verify("secret"));
    }

    #[test]
    fn ip_hash_is_stable_hex() {
        let a = hash_ip("203.0.113.7");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_ip("203.0.113.7"));
        assert_ne!(a, hash_ip("203.0.113.8"));
    }
}
