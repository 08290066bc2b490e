//! Terminal-based onboarding wizard on top of [`LiveOnboardingService`].

use std::io::{BufRead, Write};

use tracing::debug;

use crate::{
    error::{Context, Error, Result},
    service::{Confirmation, LiveOnboardingService, WizardSnapshot},
    state::WizardStep,
};

/// Run the interactive wizard on stdin/stdout for `tier`.
pub async fn run_onboarding(service: &LiveOnboardingService, tier: &str) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    match run_with_io(service, tier, stdin.lock(), &mut stdout).await? {
        Some(_) => writeln!(stdout, "Onboarding complete!")?,
        None => writeln!(stdout, "Onboarding cancelled.")?,
    }
    Ok(())
}

/// Drive the wizard from `input` until it is confirmed or abandoned.
///
/// Returns the confirmation, or `None` when the user quits or input ends.
/// The session is closed either way.
pub async fn run_with_io<R: BufRead, W: Write>(
    service: &LiveOnboardingService,
    tier: &str,
    mut input: R,
    out: &mut W,
) -> Result<Option<Confirmation>> {
    let snapshot = service.open(tier)?;
    writeln!(out, "{}: {}", snapshot.tier, snapshot.tier_price)?;

    let result = drive(service, &mut input, out).await;
    let confirmation = service.confirmation();
    service.close();
    result.map(|confirmed| confirmed.then_some(confirmation).flatten())
}

/// Returns `Ok(true)` once confirmed, `Ok(false)` if the user left.
async fn drive<R: BufRead, W: Write>(
    service: &LiveOnboardingService,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    loop {
        let snapshot = service.snapshot().ok_or(Error::NotOpen)?;
        writeln!(out, "\n{}", snapshot.prompt)?;

        let step_result = match snapshot.step {
            WizardStep::Profile => {
                let Some(name) = ask(input, out, "Legal business name")? else {
                    return Ok(false);
                };
                let Some(email) = ask(input, out, "Founder email address")? else {
                    return Ok(false);
                };
                match service.set_profile(&name, &email) {
                    Ok(_) => service.advance().await.map(drop),
                    Err(e) => Err(e),
                }
            },
            WizardStep::AddOns => {
                render_add_ons(service, &snapshot, out)?;
                let Some(cmd) = ask(input, out, "Add-on id to toggle, 'back' or Enter to continue")?
                else {
                    return Ok(false);
                };
                match cmd.as_str() {
                    "" | "next" => service.advance().await.map(drop),
                    "back" => service.retreat().map(drop),
                    id => service.toggle_add_on(id).map(drop),
                }
            },
            WizardStep::Payment => {
                render_summary(&snapshot, out)?;
                let Some(cmd) = ask(input, out, "Press Enter to finalize or 'back' to adjust")?
                else {
                    return Ok(false);
                };
                if cmd == "back" {
                    service.retreat().map(drop)
                } else {
                    writeln!(out, "Deploying…")?;
                    out.flush()?;
                    service.advance().await.map(drop)
                }
            },
            WizardStep::Confirmed => {
                render_summary(&snapshot, out)?;
                if let Some(url) = &snapshot.checkout_url {
                    writeln!(out, "Complete payment at: {url}")?;
                }
                return Ok(true);
            },
        };

        match step_result {
            Ok(()) => {},
            Err(e) if is_recoverable(&e) => writeln!(out, "! {e}")?,
            Err(e) => return Err(e),
        }
    }
}

/// Errors the user can fix by trying again.
fn is_recoverable(e: &Error) -> bool {
    matches!(
        e,
        Error::Validation { .. }
            | Error::InvalidState { .. }
            | Error::UnknownAddOn { .. }
            | Error::Submission { .. }
    )
}

/// Prompt for one line. `None` on end of input or `quit`.
fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}: ")?;
    out.flush()?;
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read wizard input")?;
    let line = line.trim();
    if read == 0 || line.eq_ignore_ascii_case("quit") {
        debug!("wizard input ended");
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

fn render_add_ons<W: Write>(
    service: &LiveOnboardingService,
    snapshot: &WizardSnapshot,
    out: &mut W,
) -> Result<()> {
    for add_on in service.catalog().add_ons() {
        let mark = if snapshot.add_ons.iter().any(|a| a.id == add_on.id) {
            'x'
        } else {
            ' '
        };
        writeln!(
            out,
            "  [{mark}] {:<6} {} (+{}) {}",
            add_on.id, add_on.name, add_on.price, add_on.description
        )?;
    }
    writeln!(out, "  Total: {}", snapshot.total)?;
    Ok(())
}

fn render_summary<W: Write>(snapshot: &WizardSnapshot, out: &mut W) -> Result<()> {
    writeln!(out, "  {:<28} {}", snapshot.tier, snapshot.tier_price)?;
    for add_on in &snapshot.add_ons {
        writeln!(out, "  {:<28} +{}", add_on.name, add_on.price)?;
    }
    writeln!(out, "  {:<28} {}", "Total Commitment", snapshot.total)?;
    Ok(())
}
