//! Wall-clock time in unix milliseconds

/// Current time (ms since the unix epoch)
#[cfg(target_arch = "wasm32")]
pub fn unix_millis() -> f64 {
    js_sys::Date::now()
}

/// Current time (ms since the unix epoch)
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_millis() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_after_2020() {
        assert!(unix_millis() > 1_577_836_800_000.0);
    }
}
