//! End-to-end scans through the public API with a stub model.

use std::sync::Arc;

use dealscan::engine::prompt::{build_user_prompt, SYSTEM_PROMPT, USER_PROMPT_PREFIX, USER_PROMPT_SUFFIX};
use dealscan::engine::scanner::DealScanner;
use dealscan::sources::{DealSource, StaticSource};
use dealscan::types::{ScanError, ScrapedDeal};

use crate::stub_model::StubModel;

fn headphones() -> ScrapedDeal {
    ScrapedDeal {
        category: "Electronics".into(),
        title: "50% Off Premium Headphones".into(),
        summary: "Top-brand noise-cancelling headphones at half price".into(),
        url: "https://example.com/deal/headphones".into(),
        details: "Limited-time offer. High-fidelity sound and comfortable over-ear design. Price only $69.99".into(),
        features: "Wireless, Active Noise Cancellation, 30-hour battery life".into(),
    }
}

#[tokio::test]
async fn test_headphones_scenario() {
    let model = StubModel::with_prices(&[69.99, -5.0, 0.0, 42.0]);
    let scanner = DealScanner::new(Arc::new(model.clone()));

    let selection = scanner.scan(&[headphones()]).await.unwrap().unwrap();

    let prices: Vec<f64> = selection.deals.iter().map(|d| d.price).collect();
    assert_eq!(prices, vec![69.99, 42.0]);
    assert_eq!(selection.deals[0].url, "https://example.com/deal/0");
    assert_eq!(selection.deals[1].url, "https://example.com/deal/3");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_empty_input_makes_no_call() {
    let model = StubModel::with_prices(&[10.0]);
    let scanner = DealScanner::new(Arc::new(model.clone()));

    assert!(scanner.scan(&[]).await.unwrap().is_none());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_prompts_sent_to_model() {
    let model = StubModel::with_prices(&[69.99]);
    let scanner = DealScanner::new(Arc::new(model.clone()));
    let deals = StaticSource::demo_extended().fetch_deals().await.unwrap();

    scanner.scan(&deals).await.unwrap();

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.messages[0].content, SYSTEM_PROMPT);

    let user = &req.messages[1].content;
    assert_eq!(user, &build_user_prompt(&deals));
    assert!(user.starts_with(USER_PROMPT_PREFIX));
    assert!(user.ends_with(USER_PROMPT_SUFFIX));
    for deal in &deals {
        assert!(user.contains(&deal.describe()));
    }
}

#[tokio::test]
async fn test_every_returned_price_is_positive() {
    let replies: [&[f64]; 4] = [
        &[1.0, 2.0, 3.0],
        &[0.0, -0.01, -100.0],
        &[0.01, 0.0, 999.99, -1.0, 5.5],
        &[],
    ];

    for prices in replies {
        let scanner = DealScanner::new(Arc::new(StubModel::with_prices(prices)));
        let selection = scanner.scan(&[headphones()]).await.unwrap().unwrap();
        assert!(selection.deals.iter().all(|d| d.price > 0.0), "prices: {prices:?}");
        assert_eq!(
            selection.len(),
            prices.iter().filter(|p| **p > 0.0).count()
        );
    }
}

#[tokio::test]
async fn test_schema_failure_propagates_unmodified() {
    let failure = ScanError::SchemaValidation("missing field `price`".into());
    let model = StubModel::with_reply(Err(failure.clone()));
    let scanner = DealScanner::new(Arc::new(model));

    let err = scanner.scan(&[headphones()]).await.unwrap_err();
    assert_eq!(err, failure);
}

#[tokio::test]
async fn test_non_conforming_reply_rejected() {
    let model = StubModel::with_reply(Ok(r#"{"deals": "none today"}"#.to_string()));
    let scanner = DealScanner::new(Arc::new(model));

    let err = scanner.scan(&[headphones()]).await.unwrap_err();
    assert!(matches!(err, ScanError::SchemaValidation(_)));
}

#[tokio::test]
async fn test_scan_from_demo_source() {
    let model = StubModel::with_prices(&[69.99]);
    let scanner = DealScanner::new(Arc::new(model.clone()));

    let selection = scanner.scan_source(&StaticSource::demo()).await.unwrap().unwrap();
    assert_eq!(selection.len(), 1);
    assert!(model.requests()[0].messages[1].content.contains("Price only $69.99"));
}
