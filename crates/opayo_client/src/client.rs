//! Registration and notification orchestration.

use std::{fmt, sync::Arc};

use error_stack::{report, ResultExt};
use masking::PeekInterface;
use opayo_core::{
    consts,
    errors::CustomResult,
    transformers::RegistrationRequest,
    types::{GatewayResponse, NotificationAck, NotificationPayload, TransactionFields},
    webhooks,
};
use tracing::instrument;

use crate::{
    config::OpayoSettings,
    errors::{ConfigurationError, RegistrationError},
    interfaces::{Method, NotificationDelegate, Request, Transport, TransactionValidator},
    validator::DefaultValidator,
};

/// Stateless client for the gateway.
///
/// One instance serves any number of concurrent registrations and
/// notifications; nothing is shared between calls except the immutable
/// configuration and the collaborators behind `Arc`s.
pub struct OpayoClient {
    settings: OpayoSettings,
    transport: Arc<dyn Transport>,
    validator: Arc<dyn TransactionValidator>,
}

impl fmt::Debug for OpayoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpayoClient")
            .field("vendor_name", &self.settings.vendor_name)
            .field("environment", &self.settings.environment)
            .finish_non_exhaustive()
    }
}

impl OpayoClient {
    /// Builds a client, failing fast on unusable configuration.
    pub fn new(
        settings: OpayoSettings,
        transport: Arc<dyn Transport>,
    ) -> CustomResult<Self, ConfigurationError> {
        if settings.vendor_name.trim().is_empty() {
            return Err(report!(ConfigurationError::MissingVendorName));
        }
        if settings.encryption_key.peek().len() != consts::CRYPT_BLOCK_SIZE {
            return Err(report!(ConfigurationError::InvalidEncryptionKey));
        }
        if let Some(raw_url) = settings.endpoint_override.as_deref() {
            url::Url::parse(raw_url).change_context(ConfigurationError::InvalidEndpoint {
                url: raw_url.to_owned(),
            })?;
        }
        if settings.failure_redirect_url.trim().is_empty() {
            return Err(report!(ConfigurationError::MissingFailureRedirect));
        }
        Ok(Self {
            settings,
            transport,
            validator: Arc::new(DefaultValidator),
        })
    }

    /// Replaces the built-in [`DefaultValidator`].
    pub fn with_validator(mut self, validator: Arc<dyn TransactionValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Registers a transaction with the gateway.
    ///
    /// Runs validation, builds and encrypts the request, performs the
    /// exchange through the transport and classifies the reply. A reply that
    /// is neither authorised nor awaiting secondary authentication surfaces
    /// as [`RegistrationError::Rejected`] carrying the full response.
    ///
    /// When no `VendorTxCode` was supplied one is generated. To know the code
    /// before the exchange (for logging or persistence), call
    /// [`TransactionFields::ensure_vendor_tx_code`] first and register the
    /// same fields. This layer never retries; retry policy belongs to the
    /// caller or the transport.
    #[instrument(skip_all, fields(vendor = %self.settings.vendor_name))]
    pub async fn register(
        &self,
        mut fields: TransactionFields,
    ) -> CustomResult<GatewayResponse, RegistrationError> {
        self.validator.validate(&fields).map_err(|error| {
            let violation = error.current_context().clone();
            error.change_context(RegistrationError::Validation(violation))
        })?;

        let vendor_tx_code = fields.ensure_vendor_tx_code().to_owned();
        tracing::info!(vendor_tx_code = %vendor_tx_code, "registering transaction with the gateway");

        let request = RegistrationRequest::try_from((
            &fields,
            self.settings.vendor_name.as_str(),
            &self.settings.encryption_key,
        ))
        .change_context(RegistrationError::Build)?;
        let body = request
            .to_form_body()
            .change_context(RegistrationError::Build)?;

        let response = self
            .transport
            .send(Request {
                method: Method::Post,
                url: self.settings.registration_url().to_owned(),
                headers: vec![(
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                )],
                body,
            })
            .await
            .change_context(RegistrationError::Network)?;
        if !(200_u16..300).contains(&response.status_code) {
            return Err(report!(RegistrationError::Network).attach_printable(format!(
                "gateway returned HTTP {}",
                response.status_code
            )));
        }

        let raw_body = String::from_utf8(response.body.to_vec())
            .change_context(RegistrationError::InvalidResponse)?;
        let gateway_response =
            GatewayResponse::parse(&raw_body).change_context(RegistrationError::InvalidResponse)?;
        tracing::info!(
            vendor_tx_code = %vendor_tx_code,
            status = %gateway_response.raw_status(),
            "gateway registration response received"
        );

        if !gateway_response.is_accepted() {
            let status = gateway_response.status();
            let status_detail = gateway_response
                .status_detail()
                .unwrap_or_default()
                .to_owned();
            return Err(report!(RegistrationError::Rejected {
                status,
                status_detail,
                response: gateway_response,
            }));
        }
        Ok(gateway_response)
    }

    /// Drives one inbound notification to a terminal acknowledgement.
    ///
    /// This method never fails: signature mismatches resolve to `INVALID`,
    /// delegate failures to `ERROR`, and the returned ack always renders a
    /// well-formed reply body via [`NotificationAck::to_body`]. Delegate
    /// errors are logged here and go no further.
    #[instrument(skip_all, fields(vendor = %self.settings.vendor_name))]
    pub async fn handle_notification(
        &self,
        raw_body: &str,
        delegate: &dyn NotificationDelegate,
    ) -> NotificationAck {
        let payload = match NotificationPayload::from_form_body(raw_body) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(?error, "notification body could not be parsed");
                return NotificationAck::Invalid {
                    status_detail: "Notification body could not be parsed".to_string(),
                    redirect_url: self.settings.failure_redirect_url.clone(),
                };
            }
        };
        let vendor_tx_code = payload.vendor_tx_code.clone();
        let vps_tx_id = payload.vps_tx_id.clone();
        tracing::info!(
            vendor_tx_code = %vendor_tx_code,
            vps_tx_id = %vps_tx_id,
            status = %payload.status,
            "processing gateway notification"
        );

        let security_key = match delegate.security_key(&vendor_tx_code).await {
            Ok(security_key) => security_key,
            Err(error) => {
                tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "security key lookup failed");
                return self.error_ack();
            }
        };

        let verified =
            match webhooks::verify_signature(&payload, &security_key, &self.settings.vendor_name) {
                Ok(verified) => verified,
                Err(error) => {
                    tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "signature computation failed");
                    false
                }
            };
        if !verified {
            tracing::warn!(
                vendor_tx_code = %vendor_tx_code,
                vps_tx_id = %vps_tx_id,
                "notification signature mismatch"
            );
            return NotificationAck::Invalid {
                status_detail: "Notification could not be verified".to_string(),
                redirect_url: self.settings.failure_redirect_url.clone(),
            };
        }

        match delegate.is_processed(&vps_tx_id).await {
            Ok(true) => {
                if let Err(error) = delegate.on_repeat(&vendor_tx_code).await {
                    tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "repeat callback failed");
                    return self.error_ack();
                }
                match delegate.redirect_url(&vendor_tx_code).await {
                    Ok(redirect_url) => NotificationAck::Ok {
                        status_detail: "Notification already processed".to_string(),
                        redirect_url,
                    },
                    Err(error) => {
                        tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "redirect URL lookup failed");
                        self.error_ack()
                    }
                }
            }
            Ok(false) => self.route_notification(&payload, delegate, &vendor_tx_code).await,
            Err(error) => {
                tracing::error!(?error, vps_tx_id = %vps_tx_id, "already-processed check failed");
                self.error_ack()
            }
        }
    }

    async fn route_notification(
        &self,
        payload: &NotificationPayload,
        delegate: &dyn NotificationDelegate,
        vendor_tx_code: &str,
    ) -> NotificationAck {
        if payload.transaction_status().is_successful() {
            if let Err(error) = delegate.on_success(vendor_tx_code, payload).await {
                tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "success callback failed");
                return self.error_ack();
            }
            match delegate.redirect_url(vendor_tx_code).await {
                Ok(redirect_url) => NotificationAck::Ok {
                    status_detail: "Notification processed".to_string(),
                    redirect_url,
                },
                Err(error) => {
                    tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "redirect URL lookup failed");
                    self.error_ack()
                }
            }
        } else {
            if let Err(error) = delegate.on_failure(vendor_tx_code, payload).await {
                tracing::error!(?error, vendor_tx_code = %vendor_tx_code, "failure callback failed");
                return self.error_ack();
            }
            NotificationAck::Invalid {
                status_detail: "Transaction was not authorised".to_string(),
                redirect_url: self.settings.failure_redirect_url.clone(),
            }
        }
    }

    fn error_ack(&self) -> NotificationAck {
        NotificationAck::Error {
            status_detail: "Unable to process the notification".to_string(),
            redirect_url: self.settings.failure_redirect_url.clone(),
        }
    }
}
