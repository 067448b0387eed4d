use tracing::debug;

use crate::err::Error;
use crate::scanner::DetectedDevice;

/// Picks the device to program.
///
/// `ftdi_desc` is the expected FTDI description of the resolved board, if
/// there is one. An explicit `device` must be a detected index; with a board
/// it must also carry that board's description. Without a device, the first
/// detected device matching the board is taken. A device given without a
/// board may use any integer notation and comes back as a decimal index.
///
/// # Errors
///
/// Will return `Err` if neither a board nor a device is given, or nothing matches.
pub fn select_device(
    ftdi_desc: Option<&str>,
    device: Option<&str>,
    detected: &[DetectedDevice],
) -> Result<String, Error> {
    let selected = match (device, ftdi_desc) {
        (Some(device), Some(desc)) => detected
            .iter()
            .find(|d| d.index == device)
            .filter(|d| d.description.contains(desc))
            .map(|d| d.index.clone()),
        (Some(device), None) => parse_int::parse::<usize>(device)
            .ok()
            .filter(|&index| index < detected.len())
            .map(|index| index.to_string()),
        (None, Some(desc)) => detected
            .iter()
            .find(|d| d.description.contains(desc))
            .map(|d| d.index.clone()),
        (None, None) => return Err(Error::InsufficientArguments),
    };
    debug!(?selected, "device selection");
    selected.ok_or(Error::BoardNotDetected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(index: &str, description: &str) -> DetectedDevice {
        DetectedDevice {
            index: index.into(),
            manufacturer: "FTDI".into(),
            description: description.into(),
        }
    }

    #[test]
    fn board_picks_first_matching_description() {
        let detected = [dev("0", "Dual FT2232H MiniModule")];
        assert_eq!(select_device(Some("FT2232H"), None, &detected).unwrap(), "0");

        let detected = [
            dev("0", "USB Serial"),
            dev("1", "Dual FT2232H"),
            dev("2", "FT2232H again"),
        ];
        assert_eq!(select_device(Some("FT2232H"), None, &detected).unwrap(), "1");
    }

    #[test]
    fn unrelated_devices_are_not_detected() {
        let detected = [dev("0", "USB Serial")];
        assert!(matches!(
            select_device(Some("FT2232H"), None, &detected),
            Err(Error::BoardNotDetected)
        ));
        assert!(matches!(
            select_device(Some("FT2232H"), None, &[]),
            Err(Error::BoardNotDetected)
        ));
    }

    #[test]
    fn explicit_device_must_match_board() {
        let detected = [dev("0", "USB Serial"), dev("1", "Dual FT2232H")];
        assert_eq!(
            select_device(Some("FT2232H"), Some("1"), &detected).unwrap(),
            "1"
        );
        assert!(matches!(
            select_device(Some("FT2232H"), Some("0"), &detected),
            Err(Error::BoardNotDetected)
        ));
        assert!(matches!(
            select_device(Some("FT2232H"), Some("7"), &detected),
            Err(Error::BoardNotDetected)
        ));
    }

    #[test]
    fn explicit_device_without_board_is_range_checked() {
        let detected = [dev("0", "a"), dev("1", "b")];
        assert_eq!(select_device(None, Some("1"), &detected).unwrap(), "1");
        for device in ["2", "-1", "one"] {
            assert!(matches!(
                select_device(None, Some(device), &detected),
                Err(Error::BoardNotDetected)
            ));
        }
    }

    #[test]
    fn explicit_index_is_normalized() {
        let detected = [dev("0", "a"), dev("1", "b")];
        assert_eq!(select_device(None, Some("0x1"), &detected).unwrap(), "1");
        assert_eq!(select_device(None, Some("0b0"), &detected).unwrap(), "0");
        assert!(matches!(
            select_device(None, Some("0x2"), &detected),
            Err(Error::BoardNotDetected)
        ));
    }

    #[test]
    fn nothing_to_go_on() {
        assert!(matches!(
            select_device(None, None, &[dev("0", "a")]),
            Err(Error::InsufficientArguments)
        ));
    }
}
