//! Threading bounds shared by every host seam.
//!
//! Host objects are driven by a single request-processing context, but that
//! context may live on any thread, so implementations must be movable across
//! threads. Sharing between threads is never required.

/// Marker trait equivalent to `Send` for host implementations.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send {}

/// Marker trait applying `Send + Sync`, used where a host object is handed
/// out behind an `Arc`.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}
