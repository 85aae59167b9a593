//! Client configuration.

use masking::Secret;
use opayo_core::consts;
use serde::Deserialize;

/// Gateway environment selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Sandbox endpoints; no real money moves.
    #[default]
    Sandbox,
    /// Live endpoints.
    Live,
}

impl Environment {
    fn registration_url(self) -> &'static str {
        match self {
            Self::Sandbox => consts::REGISTRATION_URL_SANDBOX,
            Self::Live => consts::REGISTRATION_URL_LIVE,
        }
    }
}

/// Construction-time settings for [`crate::OpayoClient`].
///
/// Validated once, when the client is built; a client that constructed
/// successfully never fails on configuration afterwards.
#[derive(Clone, Debug, Deserialize)]
pub struct OpayoSettings {
    /// Vendor account name issued by the gateway.
    pub vendor_name: String,
    /// 16-byte encryption password for the crypt envelope.
    pub encryption_key: Secret<String>,
    /// Which gateway environment to talk to.
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's registration endpoint, e.g. to point at a
    /// local relay. Must be a valid URL when set.
    #[serde(default)]
    pub endpoint_override: Option<String>,
    /// Where the cardholder is sent when a notification cannot be honoured.
    pub failure_redirect_url: String,
}

impl OpayoSettings {
    /// The effective registration endpoint.
    pub(crate) fn registration_url(&self) -> &str {
        self.endpoint_override
            .as_deref()
            .unwrap_or_else(|| self.environment.registration_url())
    }
}
