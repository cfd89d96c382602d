//! Shortener service
//!
//! Orchestrates code generation and the link store for creation, and the
//! link store plus click recorder for resolution. Collisions are an
//! internal concern: callers only ever see `CodeSpaceExhausted` if the
//! configured retry bound is somehow exhausted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::analytics::{ClickContext, ClickRecorder};
use crate::errors::{LinkforgeError, Result};
use crate::storage::{SeaOrmStore, ShortLink};
use crate::utils::{generate_code, is_valid_code, validate_url};

/// Produces candidate short codes. The seam exists so collision handling
/// can be exercised with a deterministic double.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Default generator: uniform draw from the 62-symbol alphabet.
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> String {
        generate_code(length)
    }
}

pub struct ShortenerService {
    storage: Arc<SeaOrmStore>,
    recorder: ClickRecorder,
    generator: Arc<dyn CodeGenerator>,
    code_length: usize,
    max_insert_attempts: usize,
}

impl ShortenerService {
    /// Create a service with the default generator and configured limits.
    pub fn new(storage: Arc<SeaOrmStore>, recorder: ClickRecorder) -> Self {
        Self::with_generator(storage, recorder, Arc::new(RandomCodeGenerator))
    }

    pub fn with_generator(
        storage: Arc<SeaOrmStore>,
        recorder: ClickRecorder,
        generator: Arc<dyn CodeGenerator>,
    ) -> Self {
        let config = crate::config::get_config();
        Self {
            storage,
            recorder,
            generator,
            code_length: config.codes.length,
            max_insert_attempts: config.codes.max_insert_attempts,
        }
    }

    /// Create a new short link for `original_url`.
    ///
    /// Validates the URL before touching the store, then loops:
    /// generate a code, attempt the atomic insert, and on a collision try
    /// again with a fresh code, up to the configured bound.
    pub async fn create(
        &self,
        original_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink> {
        validate_url(original_url)
            .map_err(|e| LinkforgeError::invalid_url(e.to_string()))?;

        for attempt in 1..=self.max_insert_attempts {
            let code = self.generator.generate(self.code_length);

            match self.storage.insert(&code, original_url, expires_at).await {
                Ok(link) => {
                    info!(
                        "ShortenerService: created '{}' -> '{}'",
                        link.short_code, link.original_url
                    );
                    return Ok(link);
                }
                Err(e) if e.is_duplicate_code() => {
                    debug!(
                        "ShortenerService: collision on '{}' (attempt {}/{})",
                        code, attempt, self.max_insert_attempts
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        // At length 10 over 62 symbols this is effectively unreachable,
        // but it is a defined outcome, not an infinite loop.
        Err(LinkforgeError::code_space_exhausted(format!(
            "No unique code found after {} attempts at length {}",
            self.max_insert_attempts, self.code_length
        )))
    }

    /// Resolve a code for redirection and record the click.
    ///
    /// The resolve read completes (and the target is returned) without
    /// waiting on the recording write: `record` is a buffer push, durable
    /// only once the recorder's flush runs. Resolution failures propagate;
    /// recording failures never do.
    pub async fn resolve_and_track(
        &self,
        short_code: &str,
        context: ClickContext,
    ) -> Result<String> {
        if !is_valid_code(short_code) {
            return Err(LinkforgeError::not_found(format!(
                "Short link not found: {}",
                short_code
            )));
        }

        let link = self.storage.resolve(short_code).await?;

        self.recorder.record(&link.id, context);

        Ok(link.original_url)
    }

    /// Length of the codes this service allocates.
    pub fn code_length(&self) -> usize {
        self.code_length
    }
}
