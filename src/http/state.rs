use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{config::GeneratorConfig, text::TextRendererFactory};

/// Process-wide, read-only state shared by every request.
pub struct ServiceState {
    pub generator: GeneratorConfig,
    pub text: Arc<dyn TextRendererFactory>,
    /// Bounds concurrent generations independently of the blocking pool, which also serves file
    /// reads for downloads.
    pub generations: Arc<Semaphore>,
}

impl ServiceState {
    pub fn new(
        generator: GeneratorConfig,
        text: Arc<dyn TextRendererFactory>,
        max_generations: usize,
    ) -> Self {
        Self {
            generator,
            text,
            generations: Arc::new(Semaphore::new(max_generations.max(1))),
        }
    }
}
