#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use error_stack::report;
use masking::Secret;
use opayo_client::{
    errors::{DelegateError, TransportError},
    interfaces::{NotificationDelegate, Request, Response, Transport},
    Environment, OpayoClient, OpayoSettings,
};
use opayo_core::{errors::CustomResult, types::NotificationPayload, webhooks};

// Security key issued at registration time for the test transaction, and the
// signatures the gateway computes for the payloads below under the vendor
// name "testvendor".
const SECURITY_KEY: &str = "JFK2L3N5JWPG9ZN1";
const APPROVED_SIGNATURE: &str = "10CEECFAC7ED5B6CEDED24B02C2CDBA7";
const DECLINED_SIGNATURE: &str = "BF887240E653BCAFACC69AD32CF5BE74";

struct NeverTransport;

#[async_trait]
impl Transport for NeverTransport {
    async fn send(&self, _request: Request) -> CustomResult<Response, TransportError> {
        panic!("notification handling must not touch the transport");
    }
}

#[derive(Default)]
struct MockDelegate {
    missing_key: bool,
    processed: bool,
    processed_check_fails: bool,
    success_fails: bool,
    failure_fails: bool,
    success_calls: AtomicUsize,
    failure_calls: AtomicUsize,
    repeat_calls: AtomicUsize,
}

#[async_trait]
impl NotificationDelegate for MockDelegate {
    async fn security_key(
        &self,
        _vendor_tx_code: &str,
    ) -> CustomResult<Secret<String>, DelegateError> {
        if self.missing_key {
            return Err(report!(DelegateError).attach_printable("no such transaction"));
        }
        Ok(Secret::new(SECURITY_KEY.to_string()))
    }

    async fn is_processed(&self, _vps_tx_id: &str) -> CustomResult<bool, DelegateError> {
        if self.processed_check_fails {
            return Err(report!(DelegateError).attach_printable("store unavailable"));
        }
        Ok(self.processed)
    }

    async fn redirect_url(&self, _vendor_tx_code: &str) -> CustomResult<String, DelegateError> {
        Ok("/orders/thanks".to_string())
    }

    async fn on_success(
        &self,
        _vendor_tx_code: &str,
        _payload: &NotificationPayload,
    ) -> CustomResult<(), DelegateError> {
        self.success_calls.fetch_add(1, Ordering::SeqCst);
        if self.success_fails {
            return Err(report!(DelegateError).attach_printable("order update failed"));
        }
        Ok(())
    }

    async fn on_failure(
        &self,
        _vendor_tx_code: &str,
        _payload: &NotificationPayload,
    ) -> CustomResult<(), DelegateError> {
        self.failure_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure_fails {
            return Err(report!(DelegateError).attach_printable("order update failed"));
        }
        Ok(())
    }

    async fn on_repeat(&self, _vendor_tx_code: &str) -> CustomResult<(), DelegateError> {
        self.repeat_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn client() -> OpayoClient {
    let settings = OpayoSettings {
        // Mixed case on purpose: the signature scheme lowercases it.
        vendor_name: "TestVendor".to_string(),
        encryption_key: Secret::new("0123456789abcdef".to_string()),
        environment: Environment::Sandbox,
        endpoint_override: None,
        failure_redirect_url: "/payments/failed".to_string(),
    };
    OpayoClient::new(settings, Arc::new(NeverTransport)).unwrap()
}

fn approved_payload() -> NotificationPayload {
    NotificationPayload {
        vps_tx_id: "{12345678-ABCD-1234-ABCD-123456789ABC}".to_string(),
        vendor_tx_code: "order-77".to_string(),
        status: "OK".to_string(),
        status_detail: "0000 : The Authorisation was Successful.".to_string(),
        tx_auth_no: "453679".to_string(),
        avs_cv2: "SECURITY CODE MATCH ONLY".to_string(),
        address_result: "NOTMATCHED".to_string(),
        post_code_result: "MATCHED".to_string(),
        cv2_result: "MATCHED".to_string(),
        gift_aid: "0".to_string(),
        three_d_secure_status: "NOTCHECKED".to_string(),
        card_type: "MC".to_string(),
        last_four_digits: "0001".to_string(),
        decline_code: "00".to_string(),
        expiry_date: "0330".to_string(),
        bank_auth_code: "999000".to_string(),
        vps_signature: APPROVED_SIGNATURE.to_string(),
        ..Default::default()
    }
}

fn declined_payload() -> NotificationPayload {
    NotificationPayload {
        status: "NOTAUTHED".to_string(),
        status_detail: "2000 : The Authorisation was Declined by the bank.".to_string(),
        tx_auth_no: String::new(),
        decline_code: "05".to_string(),
        vps_signature: DECLINED_SIGNATURE.to_string(),
        ..approved_payload()
    }
}

fn body_of(payload: &NotificationPayload) -> String {
    serde_urlencoded::to_string(payload).unwrap()
}

#[tokio::test]
async fn approved_notification_invokes_success_and_acks_ok() {
    let delegate = MockDelegate::default();
    let ack = client()
        .handle_notification(&body_of(&approved_payload()), &delegate)
        .await;

    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.repeat_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        ack.to_body(),
        "Status=OK\r\nStatusDetail=Notification processed\r\nRedirectURL=/orders/thanks\r\n"
    );
}

#[tokio::test]
async fn declined_notification_invokes_failure_and_acks_invalid() {
    let delegate = MockDelegate::default();
    let ack = client()
        .handle_notification(&body_of(&declined_payload()), &delegate)
        .await;

    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ack.status(), "INVALID");
    assert_eq!(ack.redirect_url(), "/payments/failed");
}

#[tokio::test]
async fn tampered_notification_is_rejected_before_any_callback() {
    let delegate = MockDelegate::default();
    let mut payload = approved_payload();
    payload.tx_auth_no = "999999".to_string();
    let ack = client()
        .handle_notification(&body_of(&payload), &delegate)
        .await;

    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.repeat_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ack.status(), "INVALID");
    // The production reply must not explain what mismatched.
    assert_eq!(ack.status_detail(), "Notification could not be verified");
}

#[tokio::test]
async fn lowercase_received_signature_still_verifies() {
    let delegate = MockDelegate::default();
    let mut payload = approved_payload();
    payload.vps_signature = APPROVED_SIGNATURE.to_lowercase();
    let ack = client()
        .handle_notification(&body_of(&payload), &delegate)
        .await;
    assert_eq!(ack.status(), "OK");
}

#[tokio::test]
async fn repeated_notifications_fire_only_the_repeat_callback() {
    let delegate = MockDelegate {
        processed: true,
        ..Default::default()
    };
    let body = body_of(&approved_payload());
    let client = client();

    for _ in 0..2 {
        let ack = client.handle_notification(&body, &delegate).await;
        assert_eq!(ack.status(), "OK");
        assert_eq!(ack.status_detail(), "Notification already processed");
        assert_eq!(ack.redirect_url(), "/orders/thanks");
    }
    assert_eq!(delegate.repeat_calls.load(Ordering::SeqCst), 2);
    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_security_key_acks_error_without_callbacks() {
    let delegate = MockDelegate {
        missing_key: true,
        ..Default::default()
    };
    let ack = client()
        .handle_notification(&body_of(&approved_payload()), &delegate)
        .await;

    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert!(ack.to_body().starts_with("Status=ERROR\r\n"));
    assert_eq!(ack.redirect_url(), "/payments/failed");
}

#[tokio::test]
async fn idempotency_store_failure_acks_error() {
    let delegate = MockDelegate {
        processed_check_fails: true,
        ..Default::default()
    };
    let ack = client()
        .handle_notification(&body_of(&approved_payload()), &delegate)
        .await;
    assert_eq!(ack.status(), "ERROR");
    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn success_callback_failure_is_contained_as_an_error_ack() {
    let delegate = MockDelegate {
        success_fails: true,
        ..Default::default()
    };
    let ack = client()
        .handle_notification(&body_of(&approved_payload()), &delegate)
        .await;

    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ack.status(), "ERROR");
    assert_eq!(ack.status_detail(), "Unable to process the notification");
}

#[tokio::test]
async fn failure_callback_failure_is_contained_as_an_error_ack() {
    let delegate = MockDelegate {
        failure_fails: true,
        ..Default::default()
    };
    let ack = client()
        .handle_notification(&body_of(&declined_payload()), &delegate)
        .await;
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ack.status(), "ERROR");
}

#[tokio::test]
async fn unknown_status_routes_to_the_failure_branch() {
    let delegate = MockDelegate::default();
    let mut payload = approved_payload();
    payload.status = "PPREDIRECT".to_string();
    payload.vps_signature = webhooks::expected_signature(
        &payload,
        &Secret::new(SECURITY_KEY.to_string()),
        "testvendor",
    )
    .unwrap();
    let ack = client()
        .handle_notification(&body_of(&payload), &delegate)
        .await;

    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ack.status(), "INVALID");
}

#[tokio::test]
async fn unparseable_bodies_ack_invalid_without_callbacks() {
    let delegate = MockDelegate::default();
    let ack = client().handle_notification("", &delegate).await;
    assert_eq!(ack.status(), "INVALID");
    assert_eq!(
        ack.status_detail(),
        "Notification body could not be parsed"
    );
    assert_eq!(delegate.success_calls.load(Ordering::SeqCst), 0);
    assert_eq!(delegate.failure_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn notification_body_survives_form_decoding() {
    // The braces and spaces in the payload travel percent- or plus-encoded;
    // decoding must restore them before the signature is computed.
    let body = body_of(&approved_payload());
    assert!(body.contains("VPSTxId=%7B12345678-ABCD-1234-ABCD-123456789ABC%7D"));
    assert!(body.contains("AVSCV2=SECURITY+CODE+MATCH+ONLY"));

    let delegate = MockDelegate::default();
    let ack = client().handle_notification(&body, &delegate).await;
    assert_eq!(ack.status(), "OK");
}
