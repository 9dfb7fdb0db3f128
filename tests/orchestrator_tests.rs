//! End-to-end tests of GatewayService over a scripted transport

mod gateway_harness;

use gateway_harness::*;
use nmi_pay::gateway::{FailureStage, TransactionOutcome};
use nmi_pay::prelude::*;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Payments
// ============================================================================

mod payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_card_sale_approved() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let resp = service.process_payment(card_sale()).await.unwrap();

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.response, "1");
        assert_eq!(resp.response_text, "SUCCESS");
        assert_eq!(resp.auth_code, "123456");
        assert_eq!(resp.transaction_id, "123");
        assert_eq!(resp.avs_response, "Y");
        assert_eq!(resp.cvv_response, "M");
        assert_eq!(resp.response_code, "100");
        assert_eq!(resp.raw_response, APPROVED);

        let sent = transport.last();
        assert_eq!(sent["security_key"], SECURITY_KEY);
        assert_eq!(sent["amount"], "10.99");
        assert_eq!(sent["type"], "sale");
        assert_eq!(sent["ccnumber"], "4111111111111111");
        assert_eq!(sent["ccexp"], "1225");
        assert_eq!(sent["cvv"], "123");
    }

    #[tokio::test]
    async fn test_type_is_sent_lowercase() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            transaction_type: "AUTH".to_string(),
            ..card_sale()
        };
        service.process_payment(req).await.unwrap();

        assert_eq!(transport.last()["type"], "auth");
    }

    #[tokio::test]
    async fn test_vault_payment_omits_card_fields() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            amount: "5.00".to_string(),
            customer_vault_id: "00000000001234567890".to_string(),
            transaction_type: "sale".to_string(),
            ..Default::default()
        };
        let resp = service.process_payment(req).await.unwrap();

        assert_eq!(resp.customer_vault_id, "00000000001234567890");
        let sent = transport.last();
        assert_eq!(sent["customer_vault_id"], "00000000001234567890");
        assert!(!sent.contains_key("ccnumber"));
        assert!(!sent.contains_key("cvv"));
    }

    #[tokio::test]
    async fn test_billing_fields_are_sent() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            billing: Some(billing()),
            ..card_sale()
        };
        service.process_payment(req).await.unwrap();

        let sent = transport.last();
        assert_eq!(sent["first_name"], "Jane");
        assert_eq!(sent["zip"], "62701");
        assert_eq!(sent["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn test_luhn_failure_never_reaches_gateway() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            credit_card: "4111111111111112".to_string(),
            ..card_sale()
        };
        let err = service.process_payment(req).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidCard);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            amount: "0.00".to_string(),
            ..card_sale()
        };
        let err = service.process_payment(req).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_funding_source_rejected() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = PaymentRequest {
            amount: "10.00".to_string(),
            transaction_type: "sale".to_string(),
            ..Default::default()
        };
        let err = service.process_payment(req).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(
            err.message,
            "either customer_vault_id or credit_card, exp_date, and cvv are required"
        );
    }

    #[tokio::test]
    async fn test_decline_is_classified() {
        let transport = MockTransport::answering(DECLINED);
        let service = service(&transport);

        let err = service.process_payment(card_sale()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
        assert_eq!(err.message, "DECLINE");
        assert_eq!(err.raw.as_deref(), Some(DECLINED));
    }

    #[tokio::test]
    async fn test_refid_lands_in_details() {
        let raw = "response=3&responsetext=Duplicate+transaction+REFID:3154&response_code=601";
        let transport = MockTransport::answering(raw);
        let service = service(&transport);

        let err = service.process_payment(card_sale()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateTransaction);
        assert_eq!(err.details.as_deref(), Some("REFID:3154"));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_as_network_error() {
        let transport = MockTransport::failing(GatewayError::network("network error: refused"));
        let service = service(&transport);

        let err = service.process_payment(card_sale()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::NetworkError);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_answer_is_processing_error() {
        let transport = MockTransport::answering("response=1&responsetext=%ZZ");
        let service = service(&transport);

        let err = service.process_payment(card_sale()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ProcessingError);
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let transport = MockTransport::answering(APPROVED).with_delay(Duration::from_millis(500));
        let service = service(&transport).with_timeout(Duration::from_millis(50));

        let err = service.process_payment(card_sale()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(err.message.contains("timed out"));
    }
}

// ============================================================================
// Tokenize
// ============================================================================

mod tokenize_tests {
    use super::*;

    fn card() -> TokenizeRequest {
        TokenizeRequest {
            credit_card: "4111111111111111".to_string(),
            exp_date: "1225".to_string(),
            cvv: "123".to_string(),
            billing: None,
        }
    }

    #[tokio::test]
    async fn test_tokenize_success() {
        let transport = MockTransport::answering(
            "response=1&responsetext=Customer+Added&cc_number=4xxxxxxxxxxx1111&card_type=visa&response_code=100",
        );
        let service = service(&transport);

        let resp = service.tokenize(card()).await.unwrap();

        assert!(resp.success);
        assert_eq!(resp.customer_vault_id.len(), 20);
        assert!(resp.customer_vault_id.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(resp.token, resp.customer_vault_id);
        assert_eq!(resp.masked, "4xxxxxxxxxxx1111");
        assert_eq!(resp.card_type, "visa");
        assert_eq!(resp.expiry_date, "1225");
        assert_eq!(resp.message, "Customer Added");

        let sent = transport.last();
        assert_eq!(sent["customer_vault"], "add_customer");
        assert_eq!(sent["customer_vault_id"], resp.customer_vault_id);
        assert_eq!(sent["amount"], "1.00");
        assert_eq!(sent["type"], "sale");
    }

    #[tokio::test]
    async fn test_tokenize_decline_is_not_an_error() {
        let transport = MockTransport::answering(DECLINED);
        let service = service(&transport);

        let resp = service.tokenize(card()).await.unwrap();

        assert!(!resp.success);
        assert_eq!(resp.message, "DECLINE");
    }

    #[tokio::test]
    async fn test_tokenize_requires_card_fields() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let req = TokenizeRequest {
            cvv: String::new(),
            ..card()
        };
        let err = service.tokenize(req).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_tokenize_ids_differ() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let first = service.tokenize(card()).await.unwrap();
        let second = service.tokenize(card()).await.unwrap();

        assert_ne!(first.customer_vault_id, second.customer_vault_id);
    }
}

// ============================================================================
// Refund, void and lookup
// ============================================================================

mod refund_tests {
    use super::*;

    fn refund(amount: &str) -> RefundRequest {
        RefundRequest {
            transaction_id: "123".to_string(),
            amount: amount.to_string(),
        }
    }

    #[tokio::test]
    async fn test_partial_refund_within_original() {
        let transport = MockTransport::answering(APPROVED).then(LOOKUP_10_00);
        let service = service(&transport);

        let resp = service.refund(refund("4.50")).await.unwrap();

        assert_eq!(resp.amount, "4.50");
        assert_eq!(resp.status_code, 200);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["transaction_id"], "123");
        assert_eq!(sent[1]["type"], "refund");
        assert_eq!(sent[1]["transactionid"], "123");
        assert_eq!(sent[1]["amount"], "4.50");
    }

    #[tokio::test]
    async fn test_refund_over_original_rejected_after_lookup() {
        let transport = MockTransport::answering(APPROVED).then(LOOKUP_10_00);
        let service = service(&transport);

        let err = service.refund(refund("10.01")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRefund);
        assert_eq!(
            err.message,
            "refund amount cannot exceed original transaction amount"
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_refund_of_exact_original_allowed() {
        let transport = MockTransport::answering(APPROVED).then(LOOKUP_10_00);
        let service = service(&transport);

        assert!(service.refund(refund("10.00")).await.is_ok());
    }

    #[tokio::test]
    async fn test_full_refund_sends_no_amount() {
        let transport = MockTransport::answering(APPROVED).then(LOOKUP_10_00);
        let service = service(&transport);

        let resp = service.refund(refund("")).await.unwrap();

        assert_eq!(resp.amount, "");
        assert!(!transport.last().contains_key("amount"));
    }

    #[tokio::test]
    async fn test_zero_refund_rejected() {
        let transport = MockTransport::answering(APPROVED).then(LOOKUP_10_00);
        let service = service(&transport);

        let err = service.refund(refund("0.00")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRefund);
        assert_eq!(err.message, "refund amount must be greater than 0");
    }

    #[tokio::test]
    async fn test_missing_original_amount_skips_comparison() {
        let transport = MockTransport::answering(APPROVED)
            .then("response=1&responsetext=OK&transactionid=123&response_code=100");
        let service = service(&transport);

        assert!(service.refund(refund("500.00")).await.is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_lookup_aborts_refund() {
        let transport = MockTransport::answering(APPROVED)
            .then("response=3&responsetext=Transaction+not+found&response_code=300");
        let service = service(&transport);

        let err = service.refund(refund("1.00")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_refund_requires_transaction_id() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let err = service.refund(RefundRequest::default()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(transport.calls(), 0);
    }
}

mod void_and_lookup_tests {
    use super::*;

    #[tokio::test]
    async fn test_void_approved() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let resp = service
            .void(VoidRequest {
                transaction_id: "123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(resp.transaction_id, "123");
        let sent = transport.last();
        assert_eq!(sent["type"], "void");
        assert_eq!(sent["transactionid"], "123");
    }

    #[tokio::test]
    async fn test_void_requires_transaction_id() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let err = service.void(VoidRequest::default()).await.unwrap_err();
        assert_eq!(err.message, "transaction_id is required");
    }

    #[tokio::test]
    async fn test_lookup_defaults_and_amount() {
        let transport = MockTransport::answering(LOOKUP_10_00);
        let service = service(&transport);

        let resp = service.lookup(LookupRequest::new("123")).await.unwrap();

        assert_eq!(resp.amount, "10.00");
        assert_eq!(resp.transaction_type, "sale");
        let sent = transport.last();
        assert_eq!(sent["transaction_id"], "123");
        assert_eq!(sent["condition"], "complete");
        assert_eq!(sent["transaction_type"], "cc");
        assert_eq!(sent["action_type"], "sale");
    }

    #[tokio::test]
    async fn test_lookup_without_amount_is_empty() {
        let transport =
            MockTransport::answering("response=1&responsetext=OK&transactionid=123&response_code=100");
        let service = service(&transport);

        let resp = service.lookup(LookupRequest::new("123")).await.unwrap();

        assert_eq!(resp.amount, "");
        assert_eq!(resp.transaction_id, "123");
    }

    #[tokio::test]
    async fn test_lookup_filters_override_defaults() {
        let transport = MockTransport::answering(LOOKUP_10_00);
        let service = service(&transport);

        let req = LookupRequest {
            condition: "pending".to_string(),
            ..LookupRequest::new("123")
        };
        service.lookup(req).await.unwrap();

        assert_eq!(transport.last()["condition"], "pending");
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

mod recurring_tests {
    use super::*;

    async fn service_with_plan(transport: &MockTransport) -> GatewayService {
        let service = service(transport);
        service.add_plan(add_plan_event(plan("gold"))).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_create_subscription() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service_with_plan(&transport).await;

        let resp = service.create_recurring(subscription("gold")).await.unwrap();

        assert_eq!(resp.subscription_id, "sub-789");
        assert_eq!(resp.status, "1");
        assert_eq!(resp.next_billing, "2026-02-01");
        assert_eq!(resp.plan_id, "gold");

        let sent = transport.last();
        assert_eq!(sent["recurring"], "add_subscription");
        assert_eq!(sent["plan_id"], "gold");
        assert_eq!(sent["customer_vault_id"], "00000000001234567890");
    }

    #[tokio::test]
    async fn test_create_subscription_unknown_plan() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service(&transport);

        let err = service.create_recurring(subscription("ghost")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert_eq!(err.message, "plan_id does not exist");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_subscription_bad_cycle() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service_with_plan(&transport).await;

        let req = RecurringPaymentRequest {
            billing_cycle: "fortnightly".to_string(),
            ..subscription("gold")
        };
        let err = service.create_recurring(req).await.unwrap_err();

        assert_eq!(err.message, "invalid billing cycle");
    }

    #[tokio::test]
    async fn test_create_subscription_bad_start_date() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service_with_plan(&transport).await;

        let req = RecurringPaymentRequest {
            start_date: "2026-01-01".to_string(),
            ..subscription("gold")
        };
        let err = service.create_recurring(req).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidRequest);
        assert!(err.message.contains("MM/DD/YYYY"));
    }

    #[tokio::test]
    async fn test_update_subscription_sends_supplied_fields() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service(&transport);

        let req = RecurringPaymentRequest {
            amount: "19.99".to_string(),
            ..Default::default()
        };
        let resp = service.update_recurring("sub-789", req).await.unwrap();

        assert_eq!(resp.subscription_id, "sub-789");
        assert_eq!(resp.status, "1");
        assert_eq!(resp.next_billing, "2026-02-01");
        let sent = transport.last();
        assert_eq!(sent["recurring"], "update_subscription");
        assert_eq!(sent["subscription_id"], "sub-789");
        assert_eq!(sent["amount"], "19.99");
        assert!(!sent.contains_key("billing_cycle"));
        assert!(!sent.contains_key("plan_id"));
    }

    #[tokio::test]
    async fn test_cancel_subscription() {
        let transport = MockTransport::answering("response=1&responsetext=OK&response_code=100");
        let service = service(&transport);

        service.cancel_recurring("sub-789").await.unwrap();

        let sent = transport.last();
        assert_eq!(sent["recurring"], "delete_subscription");
        assert_eq!(sent["subscription_id"], "sub-789");
    }

    #[tokio::test]
    async fn test_cancel_subscription_decline_is_error() {
        let transport = MockTransport::answering(
            "response=3&responsetext=Invalid+Subscription+ID&response_code=300",
        );
        let service = service(&transport);

        let err = service.cancel_recurring("sub-404").await.unwrap_err();
        assert_eq!(err.message, "Invalid Subscription ID");
    }
}

// ============================================================================
// Plans
// ============================================================================

mod plan_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_then_list() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let resp = service.add_plan(add_plan_event(plan("gold"))).await.unwrap();
        assert_eq!(resp.message, "Plan added successfully");
        assert_eq!(resp.plan.id, "gold");

        service.add_plan(add_plan_event(plan("basic"))).await.unwrap();

        let ids: Vec<String> = service
            .list_plans()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["basic", "gold"]);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_duplicate_plan() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        service.add_plan(add_plan_event(plan("gold"))).await.unwrap();
        let err = service
            .add_plan(add_plan_event(plan("gold")))
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::AlreadyExists { ref id } if id == "gold"));
    }

    #[tokio::test]
    async fn test_add_plan_missing_fields() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let incomplete = Plan {
            amount: String::new(),
            ..plan("gold")
        };
        let err = service.add_plan(add_plan_event(incomplete)).await.unwrap_err();

        assert!(matches!(err, PlanError::MissingFields { .. }));
        assert_eq!(
            err.to_string(),
            "Missing required plan fields: id, name, or amount"
        );
    }

    #[tokio::test]
    async fn test_update_plan_merges_fields() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);
        service.add_plan(add_plan_event(plan("gold"))).await.unwrap();

        let resp = service
            .update_plan(Plan {
                id: "gold".to_string(),
                amount: "29.99".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(resp.message, "Plan updated successfully");
        assert_eq!(resp.plan.amount, "29.99");
        assert_eq!(resp.plan.name, "Plan gold");
    }

    #[tokio::test]
    async fn test_update_plan_requires_id() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);

        let err = service.update_plan(Plan::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Plan ID is required");
    }

    #[tokio::test]
    async fn test_delete_plan() {
        let transport = MockTransport::answering(APPROVED);
        let service = service(&transport);
        service.add_plan(add_plan_event(plan("gold"))).await.unwrap();

        service.delete_plan("gold").await.unwrap();

        assert!(service.list_plans().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_plan("gold").await,
            Err(PlanError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_preloaded_plan_store() {
        let transport = MockTransport::answering(SUBSCRIBED);
        let service = service(&transport)
            .with_plan_store(Arc::new(InMemoryPlanStore::with_plans([plan("gold")])));

        assert!(service.create_recurring(subscription("gold")).await.is_ok());
    }
}

// ============================================================================
// Observation
// ============================================================================

mod observer_tests {
    use super::*;

    fn observed(transport: &MockTransport) -> (GatewayService, RecordingObserver) {
        let observer = RecordingObserver::default();
        let service = service(transport).with_observer(Arc::new(observer.clone()));
        (service, observer)
    }

    #[tokio::test]
    async fn test_approved_sale_reported() {
        let transport = MockTransport::answering(APPROVED);
        let (service, observer) = observed(&transport);

        service.process_payment(card_sale()).await.unwrap();

        assert_eq!(
            observer.events(),
            vec![Observed::Transaction(
                "sale".to_string(),
                TransactionOutcome::Approved
            )]
        );
    }

    #[tokio::test]
    async fn test_decline_reported_with_stage() {
        let transport = MockTransport::answering(DECLINED);
        let (service, observer) = observed(&transport);

        let _ = service.process_payment(card_sale()).await;

        assert_eq!(
            observer.events(),
            vec![
                Observed::Error(
                    "sale".to_string(),
                    FailureStage::Gateway,
                    ErrorCode::AuthenticationFailed
                ),
                Observed::Transaction("sale".to_string(), TransactionOutcome::Declined),
            ]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_reported() {
        let transport = MockTransport::answering(APPROVED);
        let (service, observer) = observed(&transport);

        let req = PaymentRequest {
            cvv: "12".to_string(),
            ..card_sale()
        };
        let _ = service.process_payment(req).await;

        assert_eq!(
            observer.events()[0],
            Observed::Error(
                "sale".to_string(),
                FailureStage::Validation,
                ErrorCode::InvalidCard
            )
        );
    }

    #[tokio::test]
    async fn test_network_failure_reported() {
        let transport = MockTransport::failing(GatewayError::network("network error: reset"));
        let (service, observer) = observed(&transport);

        let _ = service
            .void(VoidRequest {
                transaction_id: "123".to_string(),
            })
            .await;

        assert_eq!(
            observer.events(),
            vec![
                Observed::Error(
                    "void".to_string(),
                    FailureStage::Network,
                    ErrorCode::NetworkError
                ),
                Observed::Transaction("void".to_string(), TransactionOutcome::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_reported() {
        let transport = MockTransport::answering(APPROVED);
        let (service, observer) = observed(&transport);

        service.process_payment(keyed_sale("order-1")).await.unwrap();
        let _ = service.process_payment(keyed_sale("order-1")).await;

        assert!(observer.events().contains(&Observed::Error(
            "sale".to_string(),
            FailureStage::Duplicate,
            ErrorCode::DuplicateTransaction
        )));
    }
}
