//! Cheap "did the install store change" checks.
//!
//! Called on every host tick, so implementations never block and never
//! fail: anything unexpected is logged and reported as unchanged.

mod stat;
mod watch;
#[cfg(target_os = "windows")]
mod windows;

pub use stat::StatChangeSignal;
pub use watch::WatchChangeSignal;
#[cfg(target_os = "windows")]
pub use windows::RegistryChangeSignal;

pub trait ChangeSignal: Send {
    /// True if the store changed since the previous call.
    fn check_if_updated(&mut self) -> bool;
}
