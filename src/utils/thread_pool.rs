//! Pool dedicado para hashing de contraseñas (bcrypt)
//!
//! bcrypt es CPU-bound; no debe correr en los workers de actix.

use lazy_static::lazy_static;
use std::sync::Arc;
use tokio::runtime::Runtime;

lazy_static! {
    /// Pool dedicado para operaciones bloqueantes de hashing
    ///
    /// - 4 worker threads
    /// - Thread names para debug
    pub static ref HASH_POOL: Arc<Runtime> = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .thread_name("hash-worker")
            .enable_all()
            .build()
            .expect("Failed to create hash thread pool")
    );
}

/// Ejecuta una operación blocking en el pool de hashing
///
/// # Example
/// ```rust,ignore
/// let hashed = spawn_hash_blocking(move || bcrypt::hash(&password, cost)).await??;
/// ```
pub async fn spawn_hash_blocking<F, R>(f: F) -> Result<R, tokio::task::JoinError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    HASH_POOL.spawn_blocking(f).await
}
