use crate::{
    Result,
    constants::{KEYPAD_MAX_LENGTH, STATUS_ON},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Minimum card UID length in bytes (ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum card UID length in bytes (ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;

/// A remotely switchable feature of the controller.
///
/// Every variant except [`Connectivity`](FeatureFlag::Connectivity) has a row
/// in the remote store whose `status` column enables or disables it. The
/// variants are declared in status-poll order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    /// Local wifi link state. Never read from the remote store.
    Connectivity,
    /// RFID card reader.
    Rfid,
    /// Local buzzer. Named `siren` on the wire.
    #[serde(rename = "siren", alias = "alarm")]
    Alarm,
    /// Keypad code entry.
    Keypad,
    /// Vibration sensor.
    Vibration,
    /// Magnetic door contact.
    Magnetic,
    /// PIR motion sensor.
    Motion,
}

impl FeatureFlag {
    /// All features in status-poll order.
    pub const ALL: [FeatureFlag; 7] = [
        FeatureFlag::Connectivity,
        FeatureFlag::Rfid,
        FeatureFlag::Alarm,
        FeatureFlag::Keypad,
        FeatureFlag::Vibration,
        FeatureFlag::Magnetic,
        FeatureFlag::Motion,
    ];

    /// Name of the feature's row in the remote store.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            FeatureFlag::Connectivity => "connectivity",
            FeatureFlag::Rfid => "rfid",
            FeatureFlag::Alarm => "siren",
            FeatureFlag::Keypad => "keypad",
            FeatureFlag::Vibration => "vibration",
            FeatureFlag::Magnetic => "magnetic",
            FeatureFlag::Motion => "motion",
        }
    }

    /// Returns `true` if this feature is backed by a remote store row.
    #[inline]
    #[must_use]
    pub fn is_remote(self) -> bool {
        !matches!(self, FeatureFlag::Connectivity)
    }

    /// Position of the feature in [`FeatureFlag::ALL`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The feature checked after this one in the poll cycle, wrapping after `Motion`.
    #[must_use]
    pub fn next(self) -> FeatureFlag {
        FeatureFlag::ALL[(self.index() + 1) % FeatureFlag::ALL.len()]
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for FeatureFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "connectivity" | "wifi" => Ok(FeatureFlag::Connectivity),
            "rfid" => Ok(FeatureFlag::Rfid),
            "siren" | "alarm" => Ok(FeatureFlag::Alarm),
            "keypad" => Ok(FeatureFlag::Keypad),
            "vibration" => Ok(FeatureFlag::Vibration),
            "magnetic" => Ok(FeatureFlag::Magnetic),
            "motion" => Ok(FeatureFlag::Motion),
            other => Err(Error::UnknownFeature(other.to_string())),
        }
    }
}

/// Interprets a remote `status` value.
///
/// Returns `None` for an empty response, which callers treat as a failed read.
#[must_use]
pub fn parse_status(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.eq_ignore_ascii_case(STATUS_ON))
}

/// Credential source that produced an access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    Keypad,
    Rfid,
}

impl AccessSource {
    /// Both sources, in slot order.
    pub const ALL: [AccessSource; 2] = [AccessSource::Keypad, AccessSource::Rfid];

    /// The remote signal written when a grant from this source starts or ends.
    #[inline]
    #[must_use]
    pub fn signal(self) -> FeatureFlag {
        match self {
            AccessSource::Keypad => FeatureFlag::Keypad,
            AccessSource::Rfid => FeatureFlag::Rfid,
        }
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AccessSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AccessSource::Keypad => write!(f, "keypad"),
            AccessSource::Rfid => write!(f, "RFID"),
        }
    }
}

/// Normalized RFID card UID.
///
/// Stored as upper-case hex byte pairs separated by single spaces, e.g.
/// `"7A 77 C7 B2"`, which is the form used in the authorized-card list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardUid(String);

impl CardUid {
    /// Build a UID from raw reader bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the length is outside 4-10 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidCardUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }

        let normalized = bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(CardUid(normalized))
    }

    /// Get the normalized UID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses `"7A 77 C7 B2"`, `"7a77c7b2"`, `"7A:77:C7:B2"` and `"7A-77-C7-B2"`.
impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | ':' | '-'))
            .collect();

        if digits.is_empty() || !digits.is_ascii() || digits.len() % 2 != 0 {
            return Err(Error::InvalidCardUid(format!(
                "expected whole hex bytes, got '{s}'"
            )));
        }

        let bytes = (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| Error::InvalidCardUid(format!("not hexadecimal: '{s}'")))?;

        CardUid::from_bytes(&bytes)
    }
}

impl TryFrom<String> for CardUid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CardUid> for String {
    fn from(uid: CardUid) -> Self {
        uid.0
    }
}

/// Keypad access code.
///
/// # Security
/// Comparison against entered input runs in constant time, and `Debug`
/// output never reveals the code.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeypadCode(String);

impl KeypadCode {
    /// Create a new keypad code with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidKeypadCode` if the code is empty, longer than
    /// the keypad buffer, or contains keys other than `0-9` and `A-D`.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_uppercase();

        if code.is_empty() || code.len() > KEYPAD_MAX_LENGTH {
            return Err(Error::InvalidKeypadCode(format!(
                "code must be 1-{KEYPAD_MAX_LENGTH} keys, got {}",
                code.len()
            )));
        }

        if !code.chars().all(|c| c.is_ascii_digit() || ('A'..='D').contains(&c)) {
            return Err(Error::InvalidKeypadCode(
                "code may only contain 0-9 and A-D".to_string(),
            ));
        }

        Ok(KeypadCode(code))
    }

    /// Check entered keys against the code in constant time.
    #[must_use]
    pub fn matches(&self, entered: &str) -> bool {
        self.0.as_bytes().ct_eq(entered.as_bytes()).into()
    }

    /// Number of keys in the code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for KeypadCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeypadCode({})", "*".repeat(self.0.len()))
    }
}

impl TryFrom<String> for KeypadCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        KeypadCode::new(&value)
    }
}

impl From<KeypadCode> for String {
    fn from(code: KeypadCode) -> Self {
        code.0
    }
}

/// Value written to a remote signal row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncValue {
    Int(i64),
    Text(String),
}

impl SyncValue {
    /// Build the JSON update body `{column: value}` sent to the remote store.
    #[must_use]
    pub fn payload(&self, column: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(column.to_string(), serde_json::json!(self));
        serde_json::Value::Object(body)
    }

    /// Integer value, if this is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SyncValue::Int(v) => Some(*v),
            SyncValue::Text(_) => None,
        }
    }
}

impl From<bool> for SyncValue {
    fn from(value: bool) -> Self {
        SyncValue::Int(i64::from(value))
    }
}

impl From<i64> for SyncValue {
    fn from(value: i64) -> Self {
        SyncValue::Int(value)
    }
}

impl From<&str> for SyncValue {
    fn from(value: &str) -> Self {
        SyncValue::Text(value.to_string())
    }
}

impl From<String> for SyncValue {
    fn from(value: String) -> Self {
        SyncValue::Text(value)
    }
}

impl fmt::Display for SyncValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncValue::Int(v) => write!(f, "{v}"),
            SyncValue::Text(v) => f.write_str(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_feature_poll_order_wraps() {
        let mut feature = FeatureFlag::Connectivity;
        let mut visited = Vec::new();
        for _ in 0..FeatureFlag::ALL.len() {
            visited.push(feature);
            feature = feature.next();
        }
        assert_eq!(visited, FeatureFlag::ALL);
        assert_eq!(feature, FeatureFlag::Connectivity);
    }

    #[rstest]
    #[case(FeatureFlag::Rfid, "rfid")]
    #[case(FeatureFlag::Alarm, "siren")]
    #[case(FeatureFlag::Keypad, "keypad")]
    #[case(FeatureFlag::Vibration, "vibration")]
    #[case(FeatureFlag::Magnetic, "magnetic")]
    #[case(FeatureFlag::Motion, "motion")]
    fn test_feature_wire_names(#[case] feature: FeatureFlag, #[case] name: &str) {
        assert_eq!(feature.wire_name(), name);
        assert!(feature.is_remote());
        assert_eq!(name.parse::<FeatureFlag>().unwrap(), feature);
    }

    #[test]
    fn test_connectivity_is_local() {
        assert!(!FeatureFlag::Connectivity.is_remote());
        assert_eq!("wifi".parse::<FeatureFlag>().unwrap(), FeatureFlag::Connectivity);
    }

    #[test]
    fn test_alarm_alias() {
        assert_eq!("alarm".parse::<FeatureFlag>().unwrap(), FeatureFlag::Alarm);
        assert!("door".parse::<FeatureFlag>().is_err());
    }

    #[rstest]
    #[case("on", Some(true))]
    #[case("ON", Some(true))]
    #[case(" on ", Some(true))]
    #[case("off", Some(false))]
    #[case("garbage", Some(false))]
    #[case("", None)]
    #[case("   ", None)]
    fn test_parse_status(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_status(raw), expected);
    }

    #[test]
    fn test_access_source_signal() {
        assert_eq!(AccessSource::Keypad.signal(), FeatureFlag::Keypad);
        assert_eq!(AccessSource::Rfid.signal(), FeatureFlag::Rfid);
    }

    #[test]
    fn test_card_uid_from_bytes() {
        let uid = CardUid::from_bytes(&[0x7A, 0x77, 0xC7, 0xB2]).unwrap();
        assert_eq!(uid.as_str(), "7A 77 C7 B2");

        let uid = CardUid::from_bytes(&[0x43, 0x10, 0x73, 0x0E]).unwrap();
        assert_eq!(uid.as_str(), "43 10 73 0E");
    }

    #[rstest]
    #[case("7A 77 C7 B2")]
    #[case("7a77c7b2")]
    #[case("7A:77:C7:B2")]
    #[case("7a-77-c7-b2")]
    fn test_card_uid_parse_forms(#[case] raw: &str) {
        let uid: CardUid = raw.parse().unwrap();
        assert_eq!(uid.as_str(), "7A 77 C7 B2");
    }

    #[rstest]
    #[case("")]
    #[case("7A7")]
    #[case("ZZ 77 C7 B2")]
    #[case("7A 77")]
    #[case("00 11 22 33 44 55 66 77 88 99 AA")]
    fn test_card_uid_rejects_malformed(#[case] raw: &str) {
        assert!(raw.parse::<CardUid>().is_err());
    }

    #[test]
    fn test_keypad_code_matches() {
        let code = KeypadCode::new("123456").unwrap();
        assert!(code.matches("123456"));
        assert!(!code.matches("12345"));
        assert!(!code.matches("1234567"));
        assert!(!code.matches(""));
    }

    #[test]
    fn test_keypad_code_validation() {
        assert!(KeypadCode::new("").is_err());
        assert!(KeypadCode::new("123456789").is_err());
        assert!(KeypadCode::new("12#4").is_err());
        assert!(KeypadCode::new("12ab").is_ok());
    }

    #[test]
    fn test_keypad_code_debug_redacted() {
        let code = KeypadCode::new("123456").unwrap();
        let debug = format!("{code:?}");
        assert!(!debug.contains("123456"));
        assert_eq!(debug, "KeypadCode(******)");
    }

    #[test]
    fn test_sync_value_payload() {
        assert_eq!(
            SyncValue::from(true).payload("value"),
            serde_json::json!({ "value": 1 })
        );
        assert_eq!(
            SyncValue::from("on").payload("status"),
            serde_json::json!({ "status": "on" })
        );
    }

    #[test]
    fn test_sync_value_display() {
        assert_eq!(SyncValue::from(false).to_string(), "0");
        assert_eq!(SyncValue::from("off").to_string(), "off");
        assert_eq!(SyncValue::Int(1).as_int(), Some(1));
        assert_eq!(SyncValue::from("x").as_int(), None);
    }
}
