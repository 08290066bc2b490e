#![allow(clippy::unwrap_used, clippy::expect_used)]
use {
    porch_config::{Cents, PorchConfig},
    porch_onboarding::{
        Catalog, Error, LiveOnboardingService, SimulatedLeadSink, WizardStep,
    },
    std::{sync::Arc, time::Duration},
};

fn service() -> LiveOnboardingService {
    LiveOnboardingService::new(
        Arc::new(Catalog::default()),
        Arc::new(SimulatedLeadSink::new(Duration::from_millis(10))),
    )
}

#[tokio::test]
async fn legacy_accelerator_with_seo_and_ai() {
    let svc = service();
    svc.open("LEGACY ACCELERATOR").unwrap();
    svc.set_profile("Acme Co", "a@acme.com").unwrap();
    assert_eq!(svc.advance().await.unwrap().step, WizardStep::AddOns);

    svc.toggle_add_on("seo").unwrap();
    svc.toggle_add_on("ai").unwrap();
    assert_eq!(svc.advance().await.unwrap().step, WizardStep::Payment);
    assert_eq!(svc.compute_total().unwrap(), Cents(84_400));
    assert_eq!(svc.compute_total().unwrap().to_string(), "$844.00");

    let snap = svc.submit().await.unwrap();
    assert_eq!(snap.step, WizardStep::Confirmed);
    assert_eq!(snap.total, Cents(84_400));
    let ids: Vec<_> = snap.add_ons.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["seo", "ai"]);
}

#[tokio::test]
async fn directory_anchor_without_add_ons() {
    let svc = service();
    svc.open("DIRECTORY ANCHOR").unwrap();
    svc.set_profile("Corner Bakery", "owner@bakery.test").unwrap();

    let mut step = WizardStep::Profile;
    while step != WizardStep::Confirmed {
        step = svc.advance().await.unwrap().step;
        assert_eq!(svc.compute_total().unwrap(), Cents(999), "at {step}");
    }
    assert!(matches!(
        svc.advance().await,
        Err(Error::InvalidState {
            step: WizardStep::Confirmed,
            ..
        })
    ));
    assert_eq!(svc.compute_total().unwrap(), Cents(999));
}

#[tokio::test]
async fn failed_call_leaves_snapshot_unchanged() {
    let svc = service();
    svc.open("FOUNDING PARTNER").unwrap();
    let before = svc.snapshot().unwrap();

    assert!(matches!(svc.advance().await, Err(Error::Validation { .. })));
    assert!(matches!(svc.retreat(), Err(Error::InvalidState { .. })));
    assert!(matches!(
        svc.toggle_add_on("crm"),
        Err(Error::UnknownAddOn { .. })
    ));
    assert!(matches!(svc.toggle_add_on("seo"), Err(Error::InvalidState { .. })));
    assert_eq!(svc.snapshot().unwrap(), before);
}

#[tokio::test]
async fn configured_webhook_and_checkout() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/f/porch")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "tier": "FOUNDING PARTNER",
            "founder_email": "owner@bakery.test",
            "total": 2250.0,
        })))
        .with_status(200)
        .create_async()
        .await;

    let mut config = PorchConfig::default();
    config.submission.webhook_url = Some(format!("{}/f/porch", server.url()));
    config.submission.checkout_url = Some("https://buy.example.com/porch".into());
    let svc = LiveOnboardingService::from_config(&config);

    svc.open("FOUNDING PARTNER").unwrap();
    svc.set_profile("Corner Bakery", "owner@bakery.test").unwrap();
    svc.advance().await.unwrap();
    svc.toggle_add_on("ads").unwrap();
    svc.advance().await.unwrap();
    let snap = svc.advance().await.unwrap();

    assert_eq!(snap.step, WizardStep::Confirmed);
    assert_eq!(
        snap.checkout_url.as_deref(),
        Some("https://buy.example.com/porch?prefilled_email=owner%40bakery.test")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn custom_catalog_from_config() {
    let config: PorchConfig = toml::from_str(
        r#"
[pricing]
tiers = [{ name = "SOLO", price = 19.5 }]
add_ons = [{ id = "photos", name = "Photo shoot", price = 80 }]

[submission]
delay_ms = 1
"#,
    )
    .unwrap();
    let svc = LiveOnboardingService::from_config(&config);

    assert!(matches!(
        svc.open("DIRECTORY ANCHOR"),
        Err(Error::UnknownTier { .. })
    ));
    svc.open("SOLO").unwrap();
    svc.set_profile("Solo Studio", "me@solo.test").unwrap();
    svc.advance().await.unwrap();
    svc.toggle_add_on("photos").unwrap();
    assert_eq!(svc.compute_total().unwrap(), Cents(9_950));
}
