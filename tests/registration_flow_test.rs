use anyhow::Result;
use cardreg::core::CardType;
use cardreg::domain::model::CardData;
use cardreg::{
    ApiConfig, CancelFlag, Credentials, RegistrationClient, RegistrationError, ReqwestTransport,
    TransportConfig,
};
use httpmock::prelude::*;
use httpmock::Mock;

const CLIENT_ID: &str = "demo-client";
const REGISTRATIONS_PATH: &str = "/v2.01/demo-client/cardregistrations";
const REGISTRATION_PATH: &str = "/v2.01/demo-client/cardregistrations/7364852";

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: server.base_url(),
        version: "v2.01".to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: "s3cret".to_string(),
        user_id: "38080065".to_string(),
        tag: "integration".to_string(),
    }
}

fn client(server: &MockServer) -> Result<RegistrationClient<ReqwestTransport, ApiConfig>> {
    let transport = ReqwestTransport::new(
        &TransportConfig::default(),
        Credentials::new(CLIENT_ID, "s3cret"),
    )?;
    Ok(RegistrationClient::new(transport, api_config(server)))
}

fn visa() -> CardData {
    CardData::new("4970100000000154", CardType::CbVisaMastercard, "1299", "123")
}

fn mock_pre_registration<'a>(server: &'a MockServer) -> Mock<'a> {
    let processor_url = server.url("/payline/tokenize");
    server.mock(move |when, then| {
        when.method(POST)
            .path(REGISTRATIONS_PATH)
            .header_exists("authorization")
            .json_body(serde_json::json!({
                "Tag": "integration",
                "UserId": "38080065",
                "Currency": "EUR",
                "CardType": "CB_VISA_MASTERCARD"
            }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "Id": "7364852",
                "Tag": "integration",
                "UserId": "38080065",
                "CardType": "CB_VISA_MASTERCARD",
                "Currency": "EUR",
                "CardRegistrationURL": processor_url,
                "PreregistrationData": "pre-registration-payload",
                "AccessKey": "1X0m87dmM2LiwFgxPLBJ",
                "Status": "CREATED"
            }));
    })
}

#[tokio::test]
async fn test_register_card_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let pre_registration = mock_pre_registration(&server);

    let processor = server.mock(|when, then| {
        when.method(POST)
            .path("/payline/tokenize")
            .x_www_form_urlencoded_tuple("data", "pre-registration-payload")
            .x_www_form_urlencoded_tuple("accessKeyRef", "1X0m87dmM2LiwFgxPLBJ")
            .x_www_form_urlencoded_tuple("cardNumber", "4970100000000154")
            .x_www_form_urlencoded_tuple("cardExpirationDate", "1299")
            .x_www_form_urlencoded_tuple("cardCvx", "123");
        then.status(200).body("data=gcpSOxwNHZutpFWmFCAYQu1kk25qPfJFdPaHT9kM3gKumDF3GeqSw8f-k8nh-s5OC3GNnhGoFONuAyg1RZQW6rVXooQ_ysKGz-yCRhFL5hYxFpTUuuyjD0C1Xz2h3OlR");
    });

    let finalize = server.mock(|when, then| {
        when.method(PUT)
            .path(REGISTRATION_PATH)
            .header_exists("authorization")
            .json_body(serde_json::json!({
                "RegistrationData": "data=gcpSOxwNHZutpFWmFCAYQu1kk25qPfJFdPaHT9kM3gKumDF3GeqSw8f-k8nh-s5OC3GNnhGoFONuAyg1RZQW6rVXooQ_ysKGz-yCRhFL5hYxFpTUuuyjD0C1Xz2h3OlR"
            }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "Id": "7364852",
                "Tag": "integration",
                "UserId": "38080065",
                "CardId": "7364853",
                "CardType": "CB_VISA_MASTERCARD",
                "Currency": "EUR",
                "Status": "VALIDATED",
                "ResultCode": "000000",
                "ResultMessage": "Success",
                "CreationDate": 1714000000,
                "Fingerprint": "7ffcb1c0c1a44a2e8b7a4e11b4a31d07"
            }));
    });

    let client = client(&server)?;
    let registration = client
        .register_card("EUR", &visa(), &CancelFlag::new())
        .await?;

    pre_registration.assert();
    processor.assert();
    finalize.assert();

    assert_eq!(registration.id, "7364852");
    assert_eq!(registration.card_id.as_deref(), Some("7364853"));
    assert_eq!(registration.result_code.as_deref(), Some("000000"));
    assert_eq!(registration.creation_date, Some(1714000000));
    assert_eq!(
        registration.extra.get("Fingerprint"),
        Some(&serde_json::json!("7ffcb1c0c1a44a2e8b7a4e11b4a31d07"))
    );
    Ok(())
}

#[tokio::test]
async fn test_processor_error_never_reaches_finalize() -> Result<()> {
    let server = MockServer::start();
    let pre_registration = mock_pre_registration(&server);

    let processor = server.mock(|when, then| {
        when.method(POST).path("/payline/tokenize");
        then.status(200).body("errorCode=02601");
    });
    let finalize = server.mock(|when, then| {
        when.method(PUT).path(REGISTRATION_PATH);
        then.status(200);
    });

    let client = client(&server)?;
    let error = client
        .register_card("EUR", &visa(), &CancelFlag::new())
        .await
        .unwrap_err();

    pre_registration.assert();
    processor.assert();
    finalize.assert_hits(0);

    match &error {
        RegistrationError::TokenProcessing { code } => assert_eq!(code, "02601"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(error.result_message(), "Token processing error");
    Ok(())
}

#[tokio::test]
async fn test_finalize_non_json_is_distinct_from_api_error() -> Result<()> {
    let server = MockServer::start();
    mock_pre_registration(&server);
    server.mock(|when, then| {
        when.method(POST).path("/payline/tokenize");
        then.status(200).body("data=token");
    });
    server.mock(|when, then| {
        when.method(PUT).path(REGISTRATION_PATH);
        then.status(200).body("Service temporarily unavailable");
    });

    let client = client(&server)?;
    let error = client
        .register_card("EUR", &visa(), &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(
        matches!(error, RegistrationError::MalformedResponse { .. }),
        "unexpected error: {:?}",
        error
    );
    assert_eq!(error.result_code(), Some("101699"));
    assert_eq!(
        error.result_message(),
        "CardRegistration should return a valid JSON response"
    );
    Ok(())
}

#[tokio::test]
async fn test_finalize_http_error_uses_api_message() -> Result<()> {
    let server = MockServer::start();
    mock_pre_registration(&server);
    server.mock(|when, then| {
        when.method(POST).path("/payline/tokenize");
        then.status(200).body("data=token");
    });
    server.mock(|when, then| {
        when.method(PUT).path(REGISTRATION_PATH);
        then.status(400)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "Message": "One or several required parameters are missing or incorrect.",
                "Type": "param_error"
            }));
    });

    let client = client(&server)?;
    let error = client
        .register_card("EUR", &visa(), &CancelFlag::new())
        .await
        .unwrap_err();

    match error {
        RegistrationError::Api { code, message } => {
            assert_eq!(code, "101699");
            assert_eq!(
                message,
                "One or several required parameters are missing or incorrect."
            );
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_pre_registration_failure_stops_flow() -> Result<()> {
    let server = MockServer::start();
    let pre_registration = server.mock(|when, then| {
        when.method(POST).path(REGISTRATIONS_PATH);
        then.status(401);
    });
    let processor = server.mock(|when, then| {
        when.path("/payline/tokenize");
        then.status(200).body("data=token");
    });

    let client = client(&server)?;
    let error = client
        .register_card("EUR", &visa(), &CancelFlag::new())
        .await
        .unwrap_err();

    pre_registration.assert();
    processor.assert_hits(0);
    assert_eq!(error.result_message(), "CardRegistration error");
    Ok(())
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() -> Result<()> {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });

    let client = client(&server)?;
    let expired = CardData::new("4970100000000154", CardType::Amex, "0120", "1234");
    let error = client
        .register_card("EUR", &expired, &CancelFlag::new())
        .await
        .unwrap_err();

    any_request.assert_hits(0);
    assert_eq!(error.result_message(), "PAST_EXPIRY_DATE_ERROR");
    Ok(())
}

#[tokio::test]
async fn test_cancelled_before_start_sends_nothing() -> Result<()> {
    let server = MockServer::start();
    let any_request = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });

    let client = client(&server)?;
    let cancel = CancelFlag::new();
    cancel.cancel();

    let error = client.register_card("EUR", &visa(), &cancel).await.unwrap_err();

    any_request.assert_hits(0);
    assert!(matches!(error, RegistrationError::Cancelled));
    Ok(())
}

#[tokio::test]
async fn test_list_and_deactivate_cards() -> Result<()> {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/v2.01/demo-client/users/38080065/cards")
            .header_exists("authorization");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {
                    "Id": "7364853",
                    "UserId": "38080065",
                    "Alias": "497010XXXXXX0154",
                    "ExpirationDate": "1299",
                    "CardProvider": "VISA",
                    "CardType": "CB_VISA_MASTERCARD",
                    "Currency": "EUR",
                    "Active": true,
                    "Validity": "VALID"
                }
            ]));
    });
    let deactivate = server.mock(|when, then| {
        when.method(PUT)
            .path("/v2.01/demo-client/cards/7364853")
            .json_body(serde_json::json!({ "Active": false }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "Id": "7364853",
                "Alias": "497010XXXXXX0154",
                "Active": false,
                "Validity": "VALID"
            }));
    });

    let client = client(&server)?;
    let cancel = CancelFlag::new();

    let cards = client.list_cards(&cancel).await?;
    list.assert();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].alias.as_deref(), Some("497010XXXXXX0154"));
    assert_eq!(cards[0].active, Some(true));

    let card = client.deactivate_card("7364853", &cancel).await?;
    deactivate.assert();
    assert_eq!(card.active, Some(false));
    Ok(())
}

#[tokio::test]
async fn test_list_cards_error_mapping() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2.01/demo-client/users/38080065/cards");
        then.status(403)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({ "Message": "Forbidden resource" }));
    });

    let client = client(&server)?;
    let error = client.list_cards(&CancelFlag::new()).await.unwrap_err();

    assert_eq!(error.result_code(), Some("101699"));
    assert_eq!(error.result_message(), "Forbidden resource");
    Ok(())
}
