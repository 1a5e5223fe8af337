//! Backing-service WiFi state codes to legacy error codes.

use crate::legacy::types::WifiErrorCode;

/// First backing state code that denotes a failure
pub const FIRST_FAILURE_STATE: u32 = 6;
/// Last backing state code the table knows about
pub const LAST_FAILURE_STATE: u32 = 13;

/// Map a backing failure code, `None` when it lies outside the declared range.
pub fn try_translate(internal: u32) -> Option<WifiErrorCode> {
    let code = match internal {
        6 => WifiErrorCode::NoSsid,
        7 => WifiErrorCode::SsidChanged,
        8 => WifiErrorCode::ConnectionLost,
        9 => WifiErrorCode::ConnectionFailed,
        10 => WifiErrorCode::ConnectionInterrupted,
        11 => WifiErrorCode::InvalidCredentials,
        12 => WifiErrorCode::AuthFailed,
        13 => WifiErrorCode::Unknown,
        _ => return None,
    };
    Some(code)
}

/// Total version of [`try_translate`]: anything unmapped becomes `Unknown`.
pub fn translate(internal: u32) -> WifiErrorCode {
    try_translate(internal).unwrap_or(WifiErrorCode::Unknown)
}

pub fn is_failure_state(state: u32) -> bool {
    (FIRST_FAILURE_STATE..=LAST_FAILURE_STATE).contains(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_range_maps_one_to_one() {
        let mapped: Vec<_> = (FIRST_FAILURE_STATE..=LAST_FAILURE_STATE)
            .map(|c| try_translate(c).unwrap())
            .collect();
        assert_eq!(
            mapped,
            vec![
                WifiErrorCode::NoSsid,
                WifiErrorCode::SsidChanged,
                WifiErrorCode::ConnectionLost,
                WifiErrorCode::ConnectionFailed,
                WifiErrorCode::ConnectionInterrupted,
                WifiErrorCode::InvalidCredentials,
                WifiErrorCode::AuthFailed,
                WifiErrorCode::Unknown,
            ]
        );
    }

    #[test]
    fn out_of_range_is_unknown() {
        for code in [0, 1, 5, 14, 255, u32::MAX] {
            assert_eq!(try_translate(code), None);
            assert_eq!(translate(code), WifiErrorCode::Unknown);
        }
    }

    #[test]
    fn failure_state_bounds() {
        assert!(!is_failure_state(5));
        assert!(is_failure_state(6));
        assert!(is_failure_state(13));
        assert!(!is_failure_state(14));
    }
}
