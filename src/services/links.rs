//! Deep-link tokens
//!
//! Identifiers passed between dashboard pages travel as signed, expiring
//! tokens instead of raw or reversibly encrypted ids. A token only resolves
//! for the kind of page it was issued for.

use std::fmt;
use std::str::FromStr;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;
use crate::config::LinksConfig;
use crate::utils::errors::{Result, UniExpError};

pub const TOKEN_PARAM: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Event,
    Merchandise,
    Quest,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Event => "event",
            LinkKind::Merchandise => "merchandise",
            LinkKind::Quest => "quest",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkKind {
    type Err = UniExpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "event" => Ok(LinkKind::Event),
            "merchandise" => Ok(LinkKind::Merchandise),
            "quest" => Ok(LinkKind::Quest),
            other => Err(UniExpError::InvalidInput(format!("unknown link kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkClaims {
    pub sub: String,
    pub kind: LinkKind,
    pub exp: i64,
    pub jti: String,
}

#[derive(Clone)]
pub struct LinkService {
    base_url: Url,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for LinkService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkService")
            .field("base_url", &self.base_url.as_str())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl LinkService {
    pub fn new(config: &LinksConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::seconds(config.token_ttl_seconds as i64),
        })
    }

    pub fn issue(&self, kind: LinkKind, id: &str) -> Result<String> {
        let claims = LinkClaims {
            sub: id.to_string(),
            kind,
            exp: (Utc::now() + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Page URL for `kind` carrying a token for `id`, e.g. `/event?token=...`
    pub fn link_for(&self, kind: LinkKind, id: &str) -> Result<Url> {
        let mut url = self.base_url.join(kind.as_str())?;
        url.query_pairs_mut().append_pair(TOKEN_PARAM, &self.issue(kind, id)?);
        Ok(url)
    }

    /// The id carried by a token issued for `kind`
    pub fn resolve(&self, kind: LinkKind, token: &str) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<LinkClaims>(token, &self.decoding, &validation)?.claims;

        if claims.kind != kind {
            debug!(expected = %kind, actual = %claims.kind, "Link token used for the wrong page");
            return Err(UniExpError::InvalidInput(format!(
                "link was issued for a {} page, not a {} page",
                claims.kind, kind
            )));
        }
        Ok(claims.sub)
    }

    /// Resolve the token query parameter of a full link
    pub fn resolve_url(&self, kind: LinkKind, url: &Url) -> Result<String> {
        let token = url
            .query_pairs()
            .find(|(key, _)| key == TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| UniExpError::InvalidInput("link has no token".to_string()))?;
        self.resolve(kind, &token)
    }
}
