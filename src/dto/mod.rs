use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod players;
pub mod scoreboard;
pub mod sheet;
pub mod sse;
pub mod validation;

/// Render a Unix timestamp in milliseconds; `0` means unknown.
fn format_millis(millis: i64) -> Option<String> {
    if millis <= 0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_render_as_rfc3339() {
        assert_eq!(
            format_millis(1_700_000_000_000).as_deref(),
            Some("2023-11-14T22:13:20Z")
        );
        assert_eq!(format_millis(0), None);
    }
}
