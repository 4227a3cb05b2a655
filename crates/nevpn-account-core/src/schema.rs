//! Versioned persisted format for the two storage slots.
//!
//! Users slot:
//!
//! ```json
//! {"version":1,"users":{"ann@x.com":{"email":"ann@x.com","name":"Ann",
//!   "password_digest":"<64 hex>","favorites":[],"subscriptions":[]}}}
//! ```
//!
//! Session slot:
//!
//! ```json
//! {"version":1,"email":"ann@x.com"}
//! ```
//!
//! Decoding is strict. The repository layer decides what a decode failure
//! means (it treats it as "no data").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::email::Email;
use crate::error::{CoreError, Result};
use crate::record::{UserRecord, UserTable};
use crate::session::SessionPointer;

/// Current persisted schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Serialize)]
struct UsersOut<'a> {
    version: u32,
    users: &'a BTreeMap<Email, UserRecord>,
}

#[derive(Deserialize)]
struct UsersIn {
    users: BTreeMap<String, UserRecord>,
}

#[derive(Serialize, Deserialize)]
struct SessionDoc {
    version: u32,
    email: Email,
}

fn check_version(data: &str) -> Result<()> {
    let probe: VersionProbe = serde_json::from_str(data)?;
    if probe.version != SCHEMA_VERSION {
        return Err(CoreError::UnsupportedVersion(probe.version));
    }
    Ok(())
}

/// Serialize the user table.
pub fn encode_users(table: &UserTable) -> Result<String> {
    Ok(serde_json::to_string(&UsersOut {
        version: SCHEMA_VERSION,
        users: table.as_map(),
    })?)
}

/// Parse and validate the users slot.
///
/// Every key must normalize to its record's email, and no two keys may
/// normalize to the same email.
pub fn decode_users(data: &str) -> Result<UserTable> {
    check_version(data)?;
    let doc: UsersIn = serde_json::from_str(data)?;

    let mut users = BTreeMap::new();
    for (key, record) in doc.users {
        let normalized = Email::parse(&key)?;
        if normalized != record.email {
            return Err(CoreError::KeyMismatch {
                key,
                email: record.email.into_string(),
            });
        }
        if users.insert(normalized, record).is_some() {
            return Err(CoreError::Schema(format!(
                "duplicate user key after normalization: {}",
                key
            )));
        }
    }

    Ok(UserTable::from_map(users))
}

/// Serialize the session pointer.
pub fn encode_session(pointer: &SessionPointer) -> Result<String> {
    Ok(serde_json::to_string(&SessionDoc {
        version: SCHEMA_VERSION,
        email: pointer.email.clone(),
    })?)
}

/// Parse and validate the session slot.
pub fn decode_session(data: &str) -> Result<SessionPointer> {
    check_version(data)?;
    let doc: SessionDoc = serde_json::from_str(data)?;
    Ok(SessionPointer::new(doc.email))
}
