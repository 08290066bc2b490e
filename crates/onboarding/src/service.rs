//! Live onboarding service that owns the open wizard session.
//!
//! All mutations go through a mutex that is never held across an `.await`.
//! Submission runs outside the lock and is raced against the session's
//! cancellation token, so closing the wizard abandons a pending submission
//! instead of letting it confirm a session nobody is looking at.

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use {
    porch_config::{Cents, PorchConfig},
    serde::Serialize,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    sink::{Lead, LeadSink, checkout_link, lead_sink_from_config},
    state::{Advance, Profile, WizardState, WizardStep},
};

/// Outcome recorded when a session reaches [`WizardStep::Confirmed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub lead: Lead,
    pub checkout_url: Option<String>,
}

/// A selected add-on as shown in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedAddOn {
    pub id: String,
    pub name: String,
    pub price: Cents,
}

/// Read-only view of an open wizard for hosts to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub step_number: u8,
    pub prompt: &'static str,
    pub tier: String,
    pub tier_price: Cents,
    pub add_ons: Vec<SelectedAddOn>,
    pub total: Cents,
    pub profile: Profile,
    pub submission_in_flight: bool,
    pub checkout_url: Option<String>,
}

struct Session {
    id: u64,
    state: WizardState,
    cancel: CancellationToken,
    confirmation: Option<Confirmation>,
}

impl Session {
    fn snapshot(&self) -> WizardSnapshot {
        let ws = &self.state;
        WizardSnapshot {
            step: ws.step(),
            step_number: ws.step().number(),
            prompt: ws.prompt(),
            tier: ws.tier().name.clone(),
            tier_price: ws.tier().price,
            add_ons: ws
                .selected_add_ons()
                .map(|a| SelectedAddOn {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    price: a.price,
                })
                .collect(),
            total: ws.compute_total(),
            profile: ws.profile().clone(),
            submission_in_flight: ws.submission_in_flight(),
            checkout_url: self
                .confirmation
                .as_ref()
                .and_then(|c| c.checkout_url.clone()),
        }
    }
}

/// Clears the in-flight flag if a `submit()` future is dropped before the
/// sink answers.
struct PendingSubmission<'a> {
    service: &'a LiveOnboardingService,
    session: u64,
    armed: bool,
}

impl PendingSubmission<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = self.service.lock();
        if let Some(session) = guard.as_mut()
            && session.id == self.session
        {
            session.state.abort_submission();
            debug!(session = self.session, "submission abandoned by caller");
        }
    }
}

/// Onboarding wizard backed by a catalog and a lead sink.
///
/// At most one session is open at a time; opening again discards the
/// previous one.
pub struct LiveOnboardingService {
    catalog: Arc<Catalog>,
    sink: Arc<dyn LeadSink>,
    checkout_url: Option<String>,
    session: Mutex<Option<Session>>,
    next_session_id: AtomicU64,
}

impl LiveOnboardingService {
    pub fn new(catalog: Arc<Catalog>, sink: Arc<dyn LeadSink>) -> Self {
        Self {
            catalog,
            sink,
            checkout_url: None,
            session: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Hosted payment link handed out on confirmation.
    #[must_use]
    pub fn with_checkout_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_url = Some(url.into());
        self
    }

    /// Build the service from loaded configuration.
    pub fn from_config(config: &PorchConfig) -> Self {
        let catalog = Arc::new(Catalog::from_config(&config.pricing));
        let service = Self::new(catalog, lead_sink_from_config(&config.submission));
        match config.submission.live_checkout_url() {
            Some(url) => service.with_checkout_url(url),
            None => service,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the open session and return a fresh snapshot.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut WizardState) -> Result<T>,
    ) -> Result<WizardSnapshot> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(Error::NotOpen)?;
        f(&mut session.state)?;
        Ok(session.snapshot())
    }

    /// Open a fresh wizard for `tier`, discarding any previous session.
    pub fn open(&self, tier: &str) -> Result<WizardSnapshot> {
        let state = WizardState::new(Arc::clone(&self.catalog), tier)?;
        let session = Session {
            id: self.next_session_id.fetch_add(1, Ordering::Relaxed),
            state,
            cancel: CancellationToken::new(),
            confirmation: None,
        };
        let snapshot = session.snapshot();

        let mut guard = self.lock();
        if let Some(previous) = guard.replace(session) {
            previous.cancel.cancel();
            debug!(session = previous.id, "discarded previous wizard session");
        }
        info!(tier, "onboarding wizard opened");
        Ok(snapshot)
    }

    /// Discard the open session, cancelling any pending submission.
    pub fn close(&self) {
        if let Some(session) = self.lock().take() {
            session.cancel.cancel();
            info!(
                session = session.id,
                step = %session.state.step(),
                "onboarding wizard closed"
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn snapshot(&self) -> Option<WizardSnapshot> {
        self.lock().as_ref().map(Session::snapshot)
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        self.lock().as_ref().and_then(|s| s.confirmation.clone())
    }

    pub fn compute_total(&self) -> Result<Cents> {
        self.lock()
            .as_ref()
            .map(|s| s.state.compute_total())
            .ok_or(Error::NotOpen)
    }

    pub fn set_profile(&self, business_name: &str, founder_email: &str) -> Result<WizardSnapshot> {
        self.with_session(|ws| ws.set_profile(business_name, founder_email))
    }

    pub fn toggle_add_on(&self, id: &str) -> Result<WizardSnapshot> {
        self.with_session(|ws| ws.toggle_add_on(id))
    }

    pub fn retreat(&self) -> Result<WizardSnapshot> {
        self.with_session(WizardState::retreat)
    }

    /// Move forward one step; on the payment step this submits.
    pub async fn advance(&self) -> Result<WizardSnapshot> {
        let moved = {
            let mut guard = self.lock();
            let session = guard.as_mut().ok_or(Error::NotOpen)?;
            match session.state.advance()? {
                Advance::Moved(step) => {
                    debug!(%step, "wizard advanced");
                    Some(session.snapshot())
                },
                Advance::SubmissionRequired => None,
            }
        };
        match moved {
            Some(snapshot) => Ok(snapshot),
            None => self.submit().await,
        }
    }

    /// Send the lead and, once the sink accepts it, confirm the session.
    ///
    /// Only valid on the payment step with no submission in flight. A sink
    /// failure leaves the wizard on the payment step so it can be retried.
    pub async fn submit(&self) -> Result<WizardSnapshot> {
        let (id, lead, cancel) = {
            let mut guard = self.lock();
            let session = guard.as_mut().ok_or(Error::NotOpen)?;
            let lead = session.state.begin_submission()?;
            (session.id, lead, session.cancel.clone())
        };
        let mut pending = PendingSubmission {
            service: self,
            session: id,
            armed: true,
        };
        info!(session = id, tier = %lead.tier, total = %lead.total, "submitting onboarding");

        let outcome = tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            res = self.sink.submit(&lead) => res,
        };
        pending.disarm();

        let mut guard = self.lock();
        let session = match guard.as_mut() {
            Some(session) if session.id == id => session,
            _ => {
                debug!(session = id, "submission finished after the wizard was closed");
                return Err(Error::Cancelled);
            },
        };

        match outcome {
            Ok(()) => {
                session.state.finish_submission()?;
                let checkout_url = checkout_link(self.checkout_url.as_deref(), &lead);
                session.confirmation = Some(Confirmation { lead, checkout_url });
                info!(session = id, "onboarding confirmed");
                Ok(session.snapshot())
            },
            Err(e) => {
                session.state.abort_submission();
                warn!(session = id, error = %e, "onboarding submission failed");
                Err(e)
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::sink::SimulatedLeadSink,
        async_trait::async_trait,
        std::{sync::atomic::AtomicUsize, time::Duration},
    };

    fn service(delay_ms: u64) -> LiveOnboardingService {
        LiveOnboardingService::new(
            Arc::new(Catalog::default()),
            Arc::new(SimulatedLeadSink::new(Duration::from_millis(delay_ms))),
        )
    }

    async fn to_payment(svc: &LiveOnboardingService, tier: &str) {
        svc.open(tier).unwrap();
        svc.set_profile("Acme Co", "a@acme.com").unwrap();
        svc.advance().await.unwrap();
        svc.advance().await.unwrap();
    }

    /// Fails the first `failures` submissions, then accepts.
    struct FlakySink {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LeadSink for FlakySink {
        async fn submit(&self, _lead: &Lead) -> Result<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(Error::submission("backend unavailable"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn operations_require_an_open_wizard() {
        let svc = service(1);
        assert!(!svc.is_open());
        assert!(matches!(svc.advance().await, Err(Error::NotOpen)));
        assert!(matches!(svc.compute_total(), Err(Error::NotOpen)));
        assert!(matches!(svc.toggle_add_on("seo"), Err(Error::NotOpen)));
        assert!(svc.snapshot().is_none());
    }

    #[tokio::test]
    async fn reopen_discards_previous_state() {
        let svc = service(1);
        to_payment(&svc, "LEGACY ACCELERATOR").await;

        let snap = svc.open("FOUNDING PARTNER").unwrap();
        assert_eq!(snap.step, WizardStep::Profile);
        assert_eq!(snap.tier, "FOUNDING PARTNER");
        assert_eq!(snap.profile, Profile::default());
        assert_eq!(snap.total, Cents::from_dollars(2_000));
    }

    #[tokio::test]
    async fn close_resets_everything() {
        let svc = service(1);
        to_payment(&svc, "DIRECTORY ANCHOR").await;
        svc.close();
        assert!(!svc.is_open());
        assert!(svc.confirmation().is_none());
        svc.close();
    }

    #[tokio::test]
    async fn advance_from_payment_submits_and_confirms() {
        let svc = service(5).with_checkout_url("https://buy.example.com/porch");
        to_payment(&svc, "DIRECTORY ANCHOR").await;

        let snap = svc.advance().await.unwrap();
        assert_eq!(snap.step, WizardStep::Confirmed);
        assert!(!snap.submission_in_flight);
        assert_eq!(
            snap.checkout_url.as_deref(),
            Some("https://buy.example.com/porch?prefilled_email=a%40acme.com")
        );

        let confirmation = svc.confirmation().unwrap();
        assert_eq!(confirmation.lead.business_name, "Acme Co");
        assert_eq!(confirmation.lead.total, Cents(999));

        assert!(matches!(
            svc.advance().await,
            Err(Error::InvalidState {
                step: WizardStep::Confirmed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn submit_is_rejected_off_payment() {
        let svc = service(1);
        svc.open("DIRECTORY ANCHOR").unwrap();
        assert!(matches!(svc.submit().await, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn in_flight_flag_is_visible_while_pending() {
        let svc = Arc::new(service(200));
        to_payment(&svc, "DIRECTORY ANCHOR").await;

        let task = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let snap = svc.snapshot().unwrap();
        assert!(snap.submission_in_flight);
        assert!(matches!(svc.retreat(), Err(Error::InvalidState { .. })));
        assert!(matches!(svc.submit().await, Err(Error::InvalidState { .. })));

        let snap = task.await.unwrap().unwrap();
        assert_eq!(snap.step, WizardStep::Confirmed);
    }

    #[tokio::test]
    async fn close_cancels_pending_submission() {
        let svc = Arc::new(service(60_000));
        to_payment(&svc, "LEGACY ACCELERATOR").await;

        let task = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        svc.close();

        let res = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("cancelled submission returns promptly")
            .unwrap();
        assert!(matches!(res, Err(Error::Cancelled)));
        assert!(!svc.is_open());
    }

    #[tokio::test]
    async fn reopen_during_submission_keeps_new_session_clean() {
        let svc = Arc::new(service(60_000));
        to_payment(&svc, "LEGACY ACCELERATOR").await;

        let task = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.submit().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        svc.open("DIRECTORY ANCHOR").unwrap();

        assert!(matches!(task.await.unwrap(), Err(Error::Cancelled)));
        let snap = svc.snapshot().unwrap();
        assert_eq!(snap.step, WizardStep::Profile);
        assert!(!snap.submission_in_flight);
    }

    #[tokio::test]
    async fn dropped_submission_clears_in_flight() {
        let svc = service(500);
        to_payment(&svc, "DIRECTORY ANCHOR").await;

        let res = tokio::time::timeout(Duration::from_millis(20), svc.submit()).await;
        assert!(res.is_err());

        let snap = svc.snapshot().unwrap();
        assert_eq!(snap.step, WizardStep::Payment);
        assert!(!snap.submission_in_flight);
        assert_eq!(svc.retreat().unwrap().step, WizardStep::AddOns);
        svc.advance().await.unwrap();
        assert_eq!(svc.submit().await.unwrap().step, WizardStep::Confirmed);
    }

    #[tokio::test]
    async fn failed_submission_can_be_retried() {
        let sink = Arc::new(FlakySink {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let svc = LiveOnboardingService::new(Arc::new(Catalog::default()), sink.clone());
        to_payment(&svc, "FOUNDING PARTNER").await;

        let err = svc.advance().await.unwrap_err();
        assert!(matches!(err, Error::Submission { .. }));
        let snap = svc.snapshot().unwrap();
        assert_eq!(snap.step, WizardStep::Payment);
        assert!(!snap.submission_in_flight);

        let snap = svc.advance().await.unwrap();
        assert_eq!(snap.step, WizardStep::Confirmed);
        assert_eq!(snap.checkout_url, None);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn from_config_ignores_placeholder_checkout() {
        let mut config = PorchConfig::default();
        config.submission.checkout_url = Some("https://buy.stripe.com/PLACEHOLDER".into());
        let svc = LiveOnboardingService::from_config(&config);
        assert!(svc.checkout_url.is_none());
        assert_eq!(svc.catalog().tiers().len(), 3);
    }
}
