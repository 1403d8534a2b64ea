//! Windows registry reader for per-app state.

use windows::Win32::Foundation::{ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS};
use windows::Win32::System::Registry::{
    HKEY, HKEY_CURRENT_USER, KEY_READ, REG_DWORD, RegCloseKey, RegEnumKeyExW, RegEnumValueW,
    RegOpenKeyExW,
};
use windows::core::{PCWSTR, PWSTR};

use super::{LocalStateReader, Snapshot, snapshot_from_apps};
use crate::error::LocalStateError;

pub const STEAM_APPS_SUBKEY: &str = r"Software\Valve\Steam\Apps";

const MAX_NAME_LEN: usize = 256;

/// Reads `HKCU\Software\Valve\Steam\Apps`.
#[derive(Debug, Default, Clone)]
pub struct WindowsRegistryReader;

impl LocalStateReader for WindowsRegistryReader {
    fn read_snapshot(&self) -> Result<Snapshot, LocalStateError> {
        let apps = OwnedKey::open(HKEY_CURRENT_USER, STEAM_APPS_SUBKEY)?;
        let mut entries = Vec::new();
        for app_id in apps.subkey_names()? {
            let app = OwnedKey::open(apps.0, &app_id)?;
            entries.push((app_id, app.dword_values()?));
        }
        Ok(snapshot_from_apps(entries))
    }
}

/// Open registry key, closed on drop.
pub(crate) struct OwnedKey(pub(crate) HKEY);

impl OwnedKey {
    pub(crate) fn open(root: HKEY, subkey: &str) -> Result<Self, LocalStateError> {
        let wide = to_wide(subkey);
        let mut key = HKEY::default();
        let status = unsafe { RegOpenKeyExW(root, PCWSTR(wide.as_ptr()), 0, KEY_READ, &mut key) };
        if status != ERROR_SUCCESS {
            return Err(LocalStateError::Registry(format!(
                "RegOpenKeyExW({subkey}) failed: {}",
                status.0
            )));
        }
        Ok(Self(key))
    }

    fn subkey_names(&self) -> Result<Vec<String>, LocalStateError> {
        let mut names = Vec::new();
        for index in 0.. {
            let mut buf = [0u16; MAX_NAME_LEN];
            let mut len = buf.len() as u32;
            let status = unsafe {
                RegEnumKeyExW(
                    self.0,
                    index,
                    PWSTR(buf.as_mut_ptr()),
                    &mut len,
                    None,
                    PWSTR::null(),
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status != ERROR_SUCCESS {
                return Err(LocalStateError::Registry(format!(
                    "RegEnumKeyExW failed: {}",
                    status.0
                )));
            }
            names.push(String::from_utf16_lossy(&buf[..len as usize]));
        }
        Ok(names)
    }

    /// DWORD values of this key, rendered as decimal text.
    fn dword_values(&self) -> Result<Vec<(String, String)>, LocalStateError> {
        let mut values = Vec::new();
        for index in 0.. {
            let mut name = [0u16; MAX_NAME_LEN];
            let mut name_len = name.len() as u32;
            let mut kind = 0u32;
            let mut data = [0u8; 4];
            let mut data_len = data.len() as u32;
            let status = unsafe {
                RegEnumValueW(
                    self.0,
                    index,
                    PWSTR(name.as_mut_ptr()),
                    &mut name_len,
                    None,
                    Some(&mut kind as *mut u32),
                    Some(data.as_mut_ptr()),
                    Some(&mut data_len as *mut u32),
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            // Strings and blobs do not fit a DWORD buffer, skip them.
            if status == ERROR_MORE_DATA {
                continue;
            }
            if status != ERROR_SUCCESS {
                return Err(LocalStateError::Registry(format!(
                    "RegEnumValueW failed: {}",
                    status.0
                )));
            }
            if kind != REG_DWORD.0 {
                continue;
            }
            values.push((
                String::from_utf16_lossy(&name[..name_len as usize]),
                u32::from_le_bytes(data).to_string(),
            ));
        }
        Ok(values)
    }
}

impl Drop for OwnedKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

pub(crate) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
