use crate::{UuidError, UuidResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Opaque reference to an authenticator-owned account.
///
/// Once constructed the inner UUID is guaranteed canonical, so display and path derivation are
/// stable across the system.
///
/// # Construction
/// - [`AccountRef::new`] issues a fresh reference (used by authenticator backends).
/// - [`AccountRef::parse`] validates an externally supplied reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountRef(Uuid);

impl Default for AccountRef {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountRef {
    /// Issues a new random (v4) account reference.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a reference that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "account reference must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are the first four hex characters.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for AccountRef {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountRef::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AccountRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AccountRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AccountRef::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A time-prefixed entry identifier.
///
/// Format:
/// `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example:
/// `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// When generated with the previous id of the same patient, the timestamp is strictly greater
/// than the previous one (bumped by 1 ms if the clock has not moved), so lexical order of ids
/// is creation order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryId {
    timestamp: DateTime<Utc>,
    uuid: Uuid,
}

impl EntryId {
    /// Generate a new entry id, strictly later than `last` when given.
    ///
    /// Call this while holding the per-patient lock of the store that persists the entry.
    ///
    /// The clock is truncated to milliseconds, the precision of the text form, so an id read
    /// back from disk compares exactly as the one that was generated.
    pub fn generate(last: Option<&EntryId>) -> Self {
        let now = Utc::now().trunc_subsecs(3);

        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            uuid: Uuid::new_v4(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl FromStr for EntryId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, uuid_str) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid entry id format: '{}'", s))
        })?;

        let ts_no_z = ts_str.strip_suffix('Z').ok_or_else(|| {
            UuidError::InvalidInput(format!("Timestamp must end with 'Z': '{}'", ts_str))
        })?;

        let naive =
            chrono::NaiveDateTime::parse_from_str(ts_no_z, "%Y%m%dT%H%M%S%.3f").map_err(|e| {
                UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e))
            })?;

        let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
        let uuid = AccountRef::parse(uuid_str)?.uuid();

        Ok(Self { timestamp, uuid })
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            self.uuid.simple()
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EntryId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntryId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_reference() {
        let account = AccountRef::new();
        let canonical = account.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(AccountRef::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_reference() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let account = AccountRef::parse(canonical).unwrap();

        assert_eq!(account.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_non_canonical_forms() {
        for input in [
            "550e8400-e29b-41d4-a716-446655440000",
            "550E8400E29B41D4A716446655440000",
            "550e8400e29b41d4a71644665544000",
            "550e8400e29b41d4a7164466554400000",
            "550e8400e29b41d4a716446655440zzz",
            "",
        ] {
            let result = AccountRef::parse(input);
            match result {
                Err(UuidError::InvalidInput(msg)) => {
                    assert!(msg.contains("32 lowercase hex characters"), "{input}: {msg}")
                }
                Ok(_) => panic!("expected '{input}' to be rejected"),
            }
        }
    }

    #[test]
    fn test_sharded_dir_structure() {
        let account = AccountRef::parse("550e8400e29b41d4a716446655440000").unwrap();
        let sharded = account.sharded_dir(Path::new("/thejas_data/accounts"));

        assert_eq!(
            sharded,
            PathBuf::from("/thejas_data/accounts/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_round_trip_new_to_string_to_parse() {
        let original = AccountRef::new();
        let parsed: AccountRef = original.to_string().parse().unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn test_entry_id_display_and_parse() {
        let id: EntryId = "20260111T143522.045Z-550e8400e29b41d4a716446655440000"
            .parse()
            .unwrap();

        assert_eq!(
            id.to_string(),
            "20260111T143522.045Z-550e8400e29b41d4a716446655440000"
        );
        assert_eq!(
            id.timestamp().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            "2026-01-11 14:35:22.045"
        );
    }

    #[test]
    fn test_entry_id_rejects_bad_input() {
        assert!("nonsense".parse::<EntryId>().is_err());
        assert!("20260111T143522.045-550e8400e29b41d4a716446655440000"
            .parse::<EntryId>()
            .is_err());
        assert!("20260111T143522.045Z-NOTAUUID".parse::<EntryId>().is_err());
    }

    #[test]
    fn test_entry_id_is_monotonic() {
        let future = "29990101T000000.000Z-550e8400e29b41d4a716446655440000"
            .parse::<EntryId>()
            .unwrap();
        let next = EntryId::generate(Some(&future));

        assert_eq!(
            next.timestamp() - future.timestamp(),
            Duration::milliseconds(1)
        );
        assert!(next.to_string() > future.to_string());
    }

    #[test]
    fn test_entry_id_timestamp_survives_text_round_trip() {
        let id = EntryId::generate(None);
        let parsed: EntryId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert_eq!(parsed.timestamp(), id.timestamp());
    }

    #[test]
    fn test_ids_chained_through_text_never_tie() {
        // Each id is generated from its predecessor as read back from disk.
        let mut previous: Option<EntryId> = None;
        let mut seen = Vec::new();

        for _ in 0..500 {
            let reloaded = previous
                .as_ref()
                .map(|id| id.to_string().parse::<EntryId>().unwrap());
            let next = EntryId::generate(reloaded.as_ref());
            if let Some(prev) = &reloaded {
                assert!(next.timestamp() > prev.timestamp());
                assert!(next.to_string() > prev.to_string());
            }
            seen.push(next.to_string());
            previous = Some(next);
        }

        let mut sorted = seen.clone();
        sorted.sort();
        sorted.dedup_by(|a, b| a[..20] == b[..20]);
        assert_eq!(sorted, seen);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_account_ref_serde() {
        let account = AccountRef::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");

        let back: AccountRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
        assert!(serde_json::from_str::<AccountRef>("\"550E8400\"").is_err());
    }
}
