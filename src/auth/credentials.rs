use keyring::Entry;
use tracing::warn;

const SERVICE_NAME: &str = "pagegate";

/// Remembered login passwords, held in the OS keychain.
///
/// Only the interactive driver uses this; the library itself never
/// persists credentials. A host without a usable keychain just loses the
/// convenience, so failures are logged and swallowed.
pub struct CredentialStore;

impl CredentialStore {
    /// Remember `password` for `username`.
    pub fn remember(username: &str, password: &str) {
        let result = Entry::new(SERVICE_NAME, username)
            .and_then(|entry| entry.set_password(password));
        if let Err(e) = result {
            warn!(error = %e, "failed to store password in keychain");
        }
    }

    /// Stored password for `username`, if the keychain has one.
    pub fn stored_password(username: &str) -> Option<String> {
        Entry::new(SERVICE_NAME, username)
            .and_then(|entry| entry.get_password())
            .ok()
    }

    /// Forget any password stored for `username`.
    pub fn forget(username: &str) {
        if let Ok(entry) = Entry::new(SERVICE_NAME, username) {
            if let Err(e) = entry.delete_credential() {
                warn!(error = %e, "failed to delete password from keychain");
            }
        }
    }
}
