//! Onboarding wizard for the porch checkout flow.
//!
//! Flow: profile → add-ons → payment → confirmed.

pub mod catalog;
pub mod error;
pub mod service;
pub mod sink;
pub mod state;
pub mod wizard;

pub use {
    catalog::Catalog,
    error::{Context, Error, Result},
    service::{Confirmation, LiveOnboardingService, WizardSnapshot},
    sink::{Lead, LeadSink, SimulatedLeadSink, WebhookLeadSink},
    state::{WizardState, WizardStep},
};
