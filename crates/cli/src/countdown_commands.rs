use std::{io::Write, time::Duration};

use {
    anyhow::Result,
    chrono::{Local, NaiveDateTime},
    porch_common::countdown::{TimeRemaining, parse_target, time_remaining},
    tracing::debug,
};

pub async fn handle_countdown(watch: bool) -> Result<()> {
    let config = porch_config::discover_and_load();
    let target = parse_target(&config.countdown.target)?;

    if !watch {
        println!("{}", describe(time_remaining(target, now())));
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = tokio::signal::ctrl_c() => {
                writeln!(stdout)?;
                return Ok(());
            },
        }
        let remaining = time_remaining(target, now());
        write!(stdout, "\r{}", describe(remaining))?;
        stdout.flush()?;
        if remaining.is_expired() {
            writeln!(stdout)?;
            debug!("countdown reached its target");
            return Ok(());
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn describe(remaining: TimeRemaining) -> String {
    if remaining.is_expired() {
        "The stewardship window has closed.".to_string()
    } else {
        format!("Stewardship window closes in {remaining}")
    }
}
