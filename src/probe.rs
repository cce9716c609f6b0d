use chrono::Utc;

/// Server-side wall clock as fractional Unix seconds. Clients time the round
/// trip themselves; the timestamp only lets them spot clock skew.
pub fn server_timestamp() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}
