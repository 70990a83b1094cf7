use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Produces the boundary token separating the parts of one upload.
///
/// A generator is handed to a session through
/// [`UploadOptions::boundary_generator`](crate::UploadOptions::boundary_generator).
/// The token must be unlikely to appear inside any part's content and must
/// only use characters that are legal unquoted in a `Content-Type` parameter.
pub trait BoundaryGenerator: Send + Sync {
    /// Returns a fresh boundary token.
    fn generate(&self) -> String;
}

impl<F> BoundaryGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// The default generator: a run of dashes, the current time in milliseconds
/// and a random v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBoundary;

impl BoundaryGenerator for RandomBoundary {
    fn generate(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        format!("------------{}{}", millis, Uuid::new_v4().simple())
    }
}
