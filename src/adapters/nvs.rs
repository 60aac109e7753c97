//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements the raw [`StoragePort`] and, on top of it, the
//! [`PersistencePort`] that stores the supervisor's [`PersistedSnapshot`]
//! as one postcard blob.
//!
//! - Namespace isolation: the snapshot lives in its own namespace.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Host builds, and devices whose flash failed to initialise, use an
//!   in-memory map that is lost on reboot.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{PersistencePort, StorageError, StoragePort};
use crate::persistence::PersistedSnapshot;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const SNAPSHOT_NAMESPACE: &str = "compressor";
const SNAPSHOT_KEY: &str = "snapshot";

/// Upper bound for the encoded snapshot.  The real blob is well under
/// 128 bytes.
const MAX_BLOB_SIZE: usize = 256;

enum Backend {
    Ram(RefCell<HashMap<String, Vec<u8>>>),
    #[cfg(target_os = "espidf")]
    Flash,
}

pub struct NvsAdapter {
    backend: Backend,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(StorageError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
            Ok(Self {
                backend: Backend::Flash,
            })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: simulation backend");
            Ok(Self::ram())
        }
    }

    /// Adapter that keeps everything in RAM for this session only.  Used
    /// when flash initialisation fails.
    pub fn volatile() -> Self {
        warn!("NvsAdapter: running without persistence");
        Self::ram()
    }

    fn ram() -> Self {
        Self {
            backend: Backend::Ram(RefCell::new(HashMap::new())),
        }
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of a namespace or key (NVS limit: 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: ns_buf is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is closed exactly once.
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match &self.backend {
            Backend::Ram(store) => {
                let composite = Self::composite_key(namespace, key);
                match store.borrow().get(&composite) {
                    Some(data) => {
                        let len = data.len().min(buf.len());
                        buf[..len].copy_from_slice(&data[..len]);
                        Ok(len)
                    }
                    None => Err(StorageError::NotFound),
                }
            }

            #[cfg(target_os = "espidf")]
            Backend::Flash => {
                let key_buf = Self::c_name(key);
                let result = Self::with_nvs_handle(namespace, false, |handle| {
                    let mut size = buf.len();
                    // SAFETY: buf is valid for `size` bytes; key_buf is NUL-terminated.
                    let ret = unsafe {
                        nvs_get_blob(
                            handle,
                            key_buf.as_ptr() as *const _,
                            buf.as_mut_ptr() as *mut _,
                            &mut size,
                        )
                    };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                    Ok(size)
                });
                match result {
                    Ok(size) => Ok(size),
                    Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                    Err(_) => Err(StorageError::IoError),
                }
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        match &self.backend {
            Backend::Ram(store) => {
                let composite = Self::composite_key(namespace, key);
                store.borrow_mut().insert(composite, data.to_vec());
                Ok(())
            }

            #[cfg(target_os = "espidf")]
            Backend::Flash => {
                let key_buf = Self::c_name(key);
                let result = Self::with_nvs_handle(namespace, true, |handle| {
                    // SAFETY: data is valid for data.len() bytes.
                    let ret = unsafe {
                        nvs_set_blob(
                            handle,
                            key_buf.as_ptr() as *const _,
                            data.as_ptr() as *const _,
                            data.len(),
                        )
                    };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                    let ret = unsafe { nvs_commit(handle) };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                    Ok(())
                });
                result.map_err(|e| {
                    if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                        StorageError::Full
                    } else {
                        StorageError::IoError
                    }
                })
            }
        }
    }
}

impl PersistencePort for NvsAdapter {
    fn load(&self) -> Result<Option<PersistedSnapshot>, StorageError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = match self.read(SNAPSHOT_NAMESPACE, SNAPSHOT_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored snapshot");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let snapshot = PersistedSnapshot::from_bytes(&buf[..len])?;
        info!("NvsAdapter: loaded snapshot ({} bytes)", len);
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let bytes = snapshot.to_bytes()?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(StorageError::Full);
        }
        self.write(SNAPSHOT_NAMESPACE, SNAPSHOT_KEY, &bytes)
    }
}
