use crate::courses::gateway::CourseGateway;
use crate::generation::pipeline::CoursePipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: CoursePipeline,
    /// Ownership-checked reads and profile writes.
    pub gateway: CourseGateway,
}
