//! Pure state machine for the onboarding wizard. No I/O.
//!
//! Every operation either applies completely or returns an error and leaves
//! the state untouched.

use std::{collections::BTreeSet, sync::Arc};

use porch_config::{AddOn, Cents, Tier};

use crate::{
    catalog::Catalog,
    error::{Error, Result},
    sink::Lead,
};

/// Steps in the onboarding wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Profile,
    AddOns,
    Payment,
    Confirmed,
}

impl WizardStep {
    /// One-based position, as shown to the user.
    pub fn number(self) -> u8 {
        match self {
            Self::Profile => 1,
            Self::AddOns => 2,
            Self::Payment => 3,
            Self::Confirmed => 4,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Profile => "profile",
            Self::AddOns => "add-ons",
            Self::Payment => "payment",
            Self::Confirmed => "confirmed",
        })
    }
}

/// Business details collected on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Profile {
    pub business_name: String,
    pub founder_email: String,
}

impl Profile {
    /// First required field that is blank, if any.
    fn missing_field(&self) -> Option<&'static str> {
        if self.business_name.trim().is_empty() {
            Some("business_name")
        } else if self.founder_email.trim().is_empty() {
            Some("founder_email")
        } else {
            None
        }
    }
}

/// What a successful [`WizardState::advance`] asks of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The wizard moved to this step.
    Moved(WizardStep),
    /// Leaving the payment step requires a submission; nothing changed yet.
    SubmissionRequired,
}

/// The wizard state for one open session.
#[derive(Debug, Clone)]
pub struct WizardState {
    catalog: Arc<Catalog>,
    step: WizardStep,
    tier: Tier,
    selected: BTreeSet<String>,
    submission_in_flight: bool,
    profile: Profile,
}

impl WizardState {
    /// Fresh state on the profile step for `tier_name`.
    pub fn new(catalog: Arc<Catalog>, tier_name: &str) -> Result<Self> {
        let tier = catalog
            .tier(tier_name)
            .cloned()
            .ok_or_else(|| Error::UnknownTier {
                name: tier_name.to_string(),
            })?;
        Ok(Self {
            catalog,
            step: WizardStep::Profile,
            tier,
            selected: BTreeSet::new(),
            submission_in_flight: false,
            profile: Profile::default(),
        })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn tier(&self) -> &Tier {
        &self.tier
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    pub fn is_confirmed(&self) -> bool {
        self.step == WizardStep::Confirmed
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Selected add-ons in catalog order.
    pub fn selected_add_ons(&self) -> impl Iterator<Item = &AddOn> {
        self.catalog
            .add_ons()
            .iter()
            .filter(|a| self.selected.contains(&a.id))
    }

    /// Headline for the current step.
    pub fn prompt(&self) -> &'static str {
        match self.step {
            WizardStep::Profile => "Step 01: Profile Your Asset",
            WizardStep::AddOns => "Step 02: Scale Your Authority",
            WizardStep::Payment => "Final Step: Secure Entry",
            WizardStep::Confirmed => "Asset Secured.",
        }
    }

    /// Store the profile fields, trimmed. Does not change the step.
    pub fn set_profile(&mut self, business_name: &str, founder_email: &str) -> Result<()> {
        if self.step != WizardStep::Profile {
            return Err(Error::invalid_state(self.step, "edit the profile"));
        }
        let profile = Profile {
            business_name: business_name.trim().to_string(),
            founder_email: founder_email.trim().to_string(),
        };
        if let Some(field) = profile.missing_field() {
            return Err(Error::Validation { field });
        }
        self.profile = profile;
        Ok(())
    }

    /// Move forward one step.
    pub fn advance(&mut self) -> Result<Advance> {
        match self.step {
            WizardStep::Profile => {
                if let Some(field) = self.profile.missing_field() {
                    return Err(Error::Validation { field });
                }
                self.step = WizardStep::AddOns;
            },
            WizardStep::AddOns => self.step = WizardStep::Payment,
            WizardStep::Payment => {
                if self.submission_in_flight {
                    return Err(Error::invalid_state(self.step, "advance during submission"));
                }
                return Ok(Advance::SubmissionRequired);
            },
            WizardStep::Confirmed => return Err(Error::invalid_state(self.step, "advance")),
        }
        Ok(Advance::Moved(self.step))
    }

    /// Move back one step. Only the add-ons and payment steps go back.
    pub fn retreat(&mut self) -> Result<WizardStep> {
        self.step = match self.step {
            WizardStep::AddOns => WizardStep::Profile,
            WizardStep::Payment if !self.submission_in_flight => WizardStep::AddOns,
            WizardStep::Payment => {
                return Err(Error::invalid_state(self.step, "go back during submission"));
            },
            WizardStep::Profile | WizardStep::Confirmed => {
                return Err(Error::invalid_state(self.step, "go back"));
            },
        };
        Ok(self.step)
    }

    /// Flip an add-on in or out of the selection. Returns whether it is now
    /// selected.
    pub fn toggle_add_on(&mut self, id: &str) -> Result<bool> {
        if self.catalog.add_on(id).is_none() {
            return Err(Error::UnknownAddOn { id: id.to_string() });
        }
        if self.step != WizardStep::AddOns {
            return Err(Error::invalid_state(self.step, "toggle add-ons"));
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.to_string());
            Ok(true)
        }
    }

    /// Tier base price plus every selected add-on.
    pub fn compute_total(&self) -> Cents {
        let add_ons: Cents = self.selected_add_ons().map(|a| a.price).sum();
        self.tier.price + add_ons
    }

    /// The lead this session would submit right now.
    pub fn lead(&self) -> Lead {
        Lead {
            business_name: self.profile.business_name.clone(),
            founder_email: self.profile.founder_email.clone(),
            tier: self.tier.name.clone(),
            add_ons: self.selected.iter().cloned().collect(),
            total: self.compute_total(),
        }
    }

    /// Mark the submission as started and return the lead to send.
    pub fn begin_submission(&mut self) -> Result<Lead> {
        if self.step != WizardStep::Payment || self.submission_in_flight {
            return Err(Error::invalid_state(self.step, "submit"));
        }
        self.submission_in_flight = true;
        Ok(self.lead())
    }

    /// Complete a started submission and enter the terminal step.
    pub fn finish_submission(&mut self) -> Result<()> {
        if !self.submission_in_flight {
            return Err(Error::invalid_state(self.step, "confirm without a submission"));
        }
        self.submission_in_flight = false;
        self.step = WizardStep::Confirmed;
        Ok(())
    }

    /// Drop a failed submission, staying on the payment step.
    pub fn abort_submission(&mut self) {
        self.submission_in_flight = false;
    }
}
