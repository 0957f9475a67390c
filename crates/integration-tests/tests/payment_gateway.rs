//! Payment gateway behavior against unresponsive processors.

use std::time::Duration;

use copperleaf_integration_tests::card;
use copperleaf_storefront::config::PaymentConfig;
use copperleaf_storefront::payments::{PaymentError, PaymentProcessor, StripeGateway};

/// A TCP endpoint that accepts connections and never answers.
async fn hung_endpoint() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind hung endpoint");
    let addr = listener.local_addr().expect("hung endpoint address");

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    addr
}

#[tokio::test]
async fn test_hung_confirmation_call_fails_instead_of_pending() {
    let addr = hung_endpoint().await;
    let config = PaymentConfig {
        api_base: url::Url::parse(&format!("http://{addr}")).expect("url"),
        publishable_key: "pk_test_4eC39HqLyjWDarjtT1zdp7dc".to_string(),
        request_timeout: Duration::from_millis(500),
    };
    let gateway = StripeGateway::new(&config).expect("build gateway");

    // The call must resolve on its own; the outer timeout only bounds
    // the test if it does not.
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        gateway.confirm_card_payment("pi_1_secret_2", &card()),
    )
    .await
    .expect("confirmation call resolved instead of pending");

    assert!(matches!(result, Err(PaymentError::Http(_))));
}
