//! Registry change notifications via a waitable event.

use tracing::warn;
use windows::Win32::Foundation::{
    CloseHandle, ERROR_SUCCESS, FALSE, HANDLE, TRUE, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows::Win32::System::Registry::{
    HKEY, HKEY_CURRENT_USER, REG_NOTIFY_CHANGE_LAST_SET, REG_NOTIFY_CHANGE_NAME,
    RegNotifyChangeKeyValue,
};
use windows::Win32::System::Threading::{CreateEventW, WaitForSingleObject};
use windows::core::PCWSTR;

use super::ChangeSignal;
use crate::error::LocalStateError;
use crate::local::windows::{OwnedKey, STEAM_APPS_SUBKEY};

/// Arms a one-shot `RegNotifyChangeKeyValue` bound to an auto-reset event
/// and polls the event with a zero timeout.
pub struct RegistryChangeSignal {
    root: HKEY,
    subkey: String,
    event: HANDLE,
    key: Option<OwnedKey>,
}

// Registry and event handles are process-wide kernel objects.
unsafe impl Send for RegistryChangeSignal {}

impl RegistryChangeSignal {
    pub fn steam_apps() -> Result<Self, LocalStateError> {
        Self::new(HKEY_CURRENT_USER, STEAM_APPS_SUBKEY)
    }

    pub fn new(root: HKEY, subkey: &str) -> Result<Self, LocalStateError> {
        let event = unsafe { CreateEventW(None, FALSE, FALSE, PCWSTR::null()) }
            .map_err(|e| LocalStateError::Registry(format!("CreateEventW failed: {e}")))?;
        let mut signal = Self {
            root,
            subkey: subkey.to_string(),
            event,
            key: None,
        };
        signal.open();
        Ok(signal)
    }

    fn open(&mut self) {
        self.key = OwnedKey::open(self.root, &self.subkey).ok();
        self.arm();
    }

    /// Request the next notification. A failure means the key is gone.
    fn arm(&mut self) {
        let Some(key) = &self.key else {
            return;
        };
        let filter = REG_NOTIFY_CHANGE_NAME | REG_NOTIFY_CHANGE_LAST_SET;
        let status = unsafe { RegNotifyChangeKeyValue(key.0, TRUE, filter, self.event, TRUE) };
        if status != ERROR_SUCCESS {
            self.key = None;
        }
    }
}

impl ChangeSignal for RegistryChangeSignal {
    fn check_if_updated(&mut self) -> bool {
        let wait = unsafe { WaitForSingleObject(self.event, 0) };
        if wait == WAIT_OBJECT_0 {
            self.arm();
            return true;
        }
        if wait == WAIT_TIMEOUT {
            if self.key.is_none() {
                self.open();
                return self.key.is_some();
            }
            return false;
        }
        warn!(result = wait.0, "Unexpected WaitForSingleObject result");
        false
    }
}

impl Drop for RegistryChangeSignal {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.event);
        }
    }
}
