/// Config schema types (pricing catalog, submission integration, countdown).
use serde::{Deserialize, Serialize};

/// Substring that marks an integration URL as not yet filled in.
pub const PLACEHOLDER_MARKER: &str = "PLACEHOLDER";

/// A non-negative amount of money in whole cents.
///
/// Config files spell prices as decimal dollars (`9.99`, `495`); they are
/// rounded to the nearest cent on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Cents(pub u64);

impl Cents {
    pub const ZERO: Self = Self(0);
    /// Largest price a config file may carry, in dollars.
    pub const MAX_DOLLARS: f64 = 1_000_000_000.0;

    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars * 100)
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl TryFrom<f64> for Cents {
    type Error = String;

    fn try_from(dollars: f64) -> Result<Self, Self::Error> {
        if !dollars.is_finite() || dollars < 0.0 {
            return Err(format!("price must be a non-negative amount, got {dollars}"));
        }
        if dollars > Self::MAX_DOLLARS {
            return Err(format!(
                "price must not exceed {} dollars, got {dollars}",
                Self::MAX_DOLLARS
            ));
        }
        Ok(Self((dollars * 100.0).round() as u64))
    }
}

impl From<Cents> for f64 {
    fn from(c: Cents) -> Self {
        c.as_dollars()
    }
}

impl std::ops::Add for Cents {
    type Output = Self;

    /// Saturates at `u64::MAX` cents.
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, c| acc + c)
    }
}

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A named service plan with a fixed base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub price: Cents,
}

impl Tier {
    pub fn new(name: impl Into<String>, price: Cents) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// An optional priced feature layered on top of a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: Cents,
    #[serde(default)]
    pub description: String,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PorchConfig {
    pub pricing: PricingConfig,
    pub submission: SubmissionConfig,
    pub countdown: CountdownConfig,
}

/// Tier and add-on reference data offered by the onboarding wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub tiers: Vec<Tier>,
    pub add_ons: Vec<AddOn>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new("DIRECTORY ANCHOR", Cents(999)),
                Tier::new("LEGACY ACCELERATOR", Cents::from_dollars(495)),
                Tier::new("FOUNDING PARTNER", Cents::from_dollars(2_000)),
            ],
            add_ons: vec![
                AddOn {
                    id: "seo".into(),
                    name: "Hyper-Local SEO injection".into(),
                    price: Cents::from_dollars(199),
                    description: "Dominance in NWI search results.".into(),
                },
                AddOn {
                    id: "ads".into(),
                    name: "Google LSA Management".into(),
                    price: Cents::from_dollars(250),
                    description: "Verified badge & top of page placement.".into(),
                },
                AddOn {
                    id: "ai".into(),
                    name: "Human Narrative AI Agent".into(),
                    price: Cents::from_dollars(150),
                    description: "24/7 lead capture and booking.".into(),
                },
            ],
        }
    }
}

/// Where a finished onboarding goes once the user confirms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Delay of the simulated submission, used when no webhook is set.
    pub delay_ms: u64,
    /// Lead-capture endpoint receiving the lead as JSON.
    pub webhook_url: Option<String>,
    /// Hosted payment link shown after confirmation.
    pub checkout_url: Option<String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2_000,
            webhook_url: None,
            checkout_url: None,
        }
    }
}

impl SubmissionConfig {
    /// The webhook URL, if one is configured and filled in.
    pub fn live_webhook_url(&self) -> Option<&str> {
        live_url(self.webhook_url.as_deref())
    }

    /// The checkout URL, if one is configured and filled in.
    pub fn live_checkout_url(&self) -> Option<&str> {
        live_url(self.checkout_url.as_deref())
    }
}

/// Returns `true` for URLs still carrying the template placeholder.
pub fn is_placeholder(url: &str) -> bool {
    url.contains(PLACEHOLDER_MARKER)
}

fn live_url(url: Option<&str>) -> Option<&str> {
    url.map(str::trim)
        .filter(|u| !u.is_empty() && !is_placeholder(u))
}

/// End of the limited-time offer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Local time in `YYYY-MM-DDTHH:MM:SS`.
    pub target: String,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            target: "2026-01-12T23:59:59".into(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_from_dollars() {
        assert_eq!(Cents::try_from(9.99).unwrap(), Cents(999));
        assert_eq!(Cents::try_from(0.1 + 0.2).unwrap(), Cents(30));
        assert!(Cents::try_from(-1.0).is_err());
        assert!(Cents::try_from(f64::NAN).is_err());
    }

    #[test]
    fn oversized_prices_are_rejected() {
        assert_eq!(
            Cents::try_from(Cents::MAX_DOLLARS).unwrap(),
            Cents(100_000_000_000)
        );
        assert!(Cents::try_from(1.5e17).is_err());
        assert!(Cents::try_from(f64::INFINITY).is_err());

        let raw = "[pricing]\ntiers = [{ name = \"A\", price = 1.5e17 }]\n";
        let err = toml::from_str::<PorchConfig>(raw).unwrap_err();
        assert!(err.to_string().contains("must not exceed"), "{err}");
    }

    #[test]
    fn addition_saturates() {
        let big = Cents(u64::MAX - 1);
        assert_eq!(big + Cents(999), Cents(u64::MAX));
        let total: Cents = [big, big, Cents(1)].into_iter().sum();
        assert_eq!(total, Cents(u64::MAX));
    }

    #[test]
    fn cents_display() {
        assert_eq!(Cents(999).to_string(), "$9.99");
        assert_eq!(Cents(84_400).to_string(), "$844.00");
        assert_eq!(Cents::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn default_pricing_matches_landing_page() {
        let pricing = PricingConfig::default();
        let names: Vec<_> = pricing.tiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, [
            "DIRECTORY ANCHOR",
            "LEGACY ACCELERATOR",
            "FOUNDING PARTNER"
        ]);
        let total: Cents = pricing.add_ons.iter().map(|a| a.price).sum();
        assert_eq!(total, Cents::from_dollars(599));
    }

    #[test]
    fn placeholder_urls_are_not_live() {
        let cfg = SubmissionConfig {
            webhook_url: Some("https://formspree.io/f/PLACEHOLDER".into()),
            checkout_url: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(cfg.live_webhook_url(), None);
        assert_eq!(cfg.live_checkout_url(), None);

        let cfg = SubmissionConfig {
            webhook_url: Some("https://formspree.io/f/abc123".into()),
            ..Default::default()
        };
        assert_eq!(cfg.live_webhook_url(), Some("https://formspree.io/f/abc123"));
    }

    #[test]
    fn pricing_parses_decimal_dollars() {
        let cfg: PorchConfig = toml::from_str(
            r#"
[pricing]
tiers = [{ name = "STARTER", price = 12.5 }]
add_ons = []
"#,
        )
        .unwrap();
        assert_eq!(cfg.pricing.tiers[0].price, Cents(1_250));
        assert!(cfg.pricing.add_ons.is_empty());
        assert_eq!(cfg.submission.delay_ms, 2_000);
    }
}
