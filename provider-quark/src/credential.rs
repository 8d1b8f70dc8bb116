//! Credential extraction from the raw cookie string.
//!
//! The cookie is supplied verbatim by the user. Two kinds of extra
//! material may be embedded in it: a session token (`st`), sent as a
//! dedicated header on web endpoints, and the mobile-auth triple
//! (`kps`/`sign`/`vcode`) required by the growth endpoints. Both are
//! optional; a cookie without them still works for plain listing/saving.

use regex::Regex;
use std::sync::OnceLock;

/// Mobile-auth query parameters (growth endpoints only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileParams {
    pub kps: String,
    pub sign: String,
    pub vcode: String,
}

/// Parsed credential. The raw cookie is kept verbatim for the `Cookie`
/// header; extracted pieces are views derived from it once.
#[derive(Debug, Clone)]
pub struct QuarkCredential {
    cookie: String,
    session_token: Option<String>,
    mobile: Option<MobileParams>,
}

fn session_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=st([a-zA-Z0-9]+);?").unwrap())
}

fn mobile_param_re(key: &str) -> Regex {
    // word boundary on the left so e.g. `designsign=` does not match `sign=`
    Regex::new(&format!(r"(?:^|[^\w]){key}=([a-zA-Z0-9%+/=]+)")).unwrap()
}

impl QuarkCredential {
    pub fn parse(cookie: &str) -> Self {
        let cookie = cookie.trim().to_string();

        let session_token = session_token_re().captures(&cookie).map(|c| c[1].to_string());

        let mobile = Self::extract_mobile(&cookie);

        Self {
            cookie,
            session_token,
            mobile,
        }
    }

    fn extract_mobile(cookie: &str) -> Option<MobileParams> {
        let get = |key: &str| {
            mobile_param_re(key)
                .captures(cookie)
                // the app percent-encodes twice
                .map(|c| c[1].replace("%25", "%"))
        };
        Some(MobileParams {
            kps: get("kps")?,
            sign: get("sign")?,
            vcode: get("vcode")?,
        })
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn mobile(&self) -> Option<&MobileParams> {
        self.mobile.as_ref()
    }

    /// A full account cookie carries the account id; sign-in-only
    /// credentials do not and cannot save.
    pub fn has_account_cookie(&self) -> bool {
        self.cookie.contains("__uid")
    }
}
