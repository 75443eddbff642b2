use std::{path::Path, time::Duration};

use console::{style, StyledObject};

lazy_static::lazy_static! {
    pub static ref GREEN_TICK: StyledObject<&'static str> = style("✔").green();
    pub static ref RED_CROSS: StyledObject<&'static str> = style("✗").red();
}

fn elapsed_time_str(dur: &Duration) -> String {
    format!("{}.{:03}s", dur.as_secs(), dur.subsec_millis())
}

pub fn finish(status_message: &str, context: &Path, dur: Duration) {
    println!(
        "{} {} ({}) took, {}",
        GREEN_TICK.to_string(),
        status_message,
        context.display(),
        elapsed_time_str(&dur)
    );
}

pub fn failed(status_message: &str) {
    eprintln!("{} {}", RED_CROSS.to_string(), status_message);
}
