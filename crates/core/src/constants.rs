//! Constants used throughout the Thejas core crate.
//!
//! Directory names, file names and policy defaults live here so the file-backed stores and the
//! configuration agree on them.

/// Default directory for portal data when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "thejas_data";

/// Directory name for identifier mappings.
pub const MAPPINGS_DIR_NAME: &str = "mappings";

/// Directory name for account profiles.
pub const ACCOUNTS_DIR_NAME: &str = "accounts";

/// Directory name for authenticator credentials.
pub const CREDENTIALS_DIR_NAME: &str = "credentials";

/// Directory name for daily clinical entries.
pub const ENTRIES_DIR_NAME: &str = "entries";

/// Directory name for prescriptions.
pub const PRESCRIPTIONS_DIR_NAME: &str = "prescriptions";

/// Directory name for appointments.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Filename for an account profile inside its sharded directory.
pub const PROFILE_FILENAME: &str = "profile.json";

/// Filename for a credential record inside its sharded directory.
pub const CREDENTIAL_FILENAME: &str = "credential.json";

/// Extension used by every stored JSON document.
pub const JSON_EXTENSION: &str = "json";

/// Number of identifier candidates tried before allocation gives up.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 10;

/// Extra full allocations attempted after losing a create race.
pub const DEFAULT_RACE_RETRIES: u32 = 1;

/// Range the random identifier suffix is drawn from.
pub const SUFFIX_RANGE: std::ops::RangeInclusive<u16> = 1000..=9999;
