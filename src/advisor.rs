//! Advisor integration: staleness tracking for in-flight requests and the
//! panel summary. Requests are never cancelled at the source; a response
//! that outlives its context is discarded on arrival.

use web_time::Instant;

use crate::api::Advice;

/// Token captured when an advisor request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdviceToken(u64);

/// Epoch counter deciding whether an advisor response is still wanted.
/// Closing the panel or any board change bumps the epoch; a response whose
/// token no longer matches is silently dropped.
#[derive(Debug, Default)]
pub struct AdviceGate {
    epoch: u64,
}

impl AdviceGate {
    pub fn issue(&self) -> AdviceToken {
        AdviceToken(self.epoch)
    }

    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }

    pub fn is_current(&self, token: AdviceToken) -> bool {
        token.0 == self.epoch
    }
}

/// Wall-clock measurement of one advisor round-trip, used for the panel
/// when the engine omits its own solving time.
#[derive(Debug)]
pub struct AdviceTimer {
    started: Instant,
}

impl AdviceTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

fn format_solving_time(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms} ms")
    } else {
        format!("{ms} ms ({:.2} s)", ms as f64 / 1000.0)
    }
}

/// Panel body for a concrete recommendation. `fallback_ms` is the
/// client-measured round-trip, used when the engine reported no time.
pub fn advice_summary(advice: &Advice, fallback_ms: u64) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        "<h4>Best Move: {}</h4><p>{}</p>",
        advice.position, advice.explanation
    ));
    if advice.is_heuristic {
        html.push_str("<p class=\"advisor-notice\">Using heuristic evaluation</p>");
    } else {
        html.push_str("<p class=\"advisor-notice\">Using constraint-solving analysis</p>");
    }

    let ms = advice.solving_time_ms.unwrap_or(fallback_ms);
    html.push_str(&format!(
        "<div class=\"advisor-item\"><strong>Processing Time:</strong> {}</div>",
        format_solving_time(ms)
    ));

    if let Some(prob) = advice.win_probability {
        html.push_str(&format!(
            "<div class=\"advisor-item\"><strong>Win Probability:</strong> {prob:.0}%</div>"
        ));
    }

    if !advice.alternatives.is_empty() {
        html.push_str("<h4>Alternative Moves</h4>");
        for alt in &advice.alternatives {
            html.push_str(&format!(
                "<div class=\"advisor-item\"><strong>Position {}</strong>: {}</div>",
                alt.position, alt.explanation
            ));
        }
    }

    html
}
