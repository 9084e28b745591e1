//! Identifier generation and backend key derivation.

use crate::{ContentId, ConversionService};
use std::any::{Any, type_name};
use std::sync::Arc;
use uuid::Uuid;
use vellum_error::{ResolutionError, ResolutionErrorKind, VellumResult};

/// Source of fresh, globally unique identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier.
    fn generate(&self) -> Uuid;
}

/// Random (v4) UUID generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Mints identifiers in an entity's declared type and maps identifiers to
/// backend keys.
///
/// Generation is two-step: a generic UUID is produced, then coerced to the
/// declared identifier type through the registered conversion, falling back
/// to parsing the UUID's string form.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use vellum_core::IdentifierCodec;
///
/// let codec = IdentifierCodec::default();
/// let id: String = codec.generate().unwrap();
/// assert_eq!(codec.to_backend_key(&id).unwrap(), id);
///
/// let typed: Uuid = codec.generate().unwrap();
/// assert_eq!(codec.to_backend_key(&typed).unwrap(), typed.to_string());
/// ```
#[derive(Clone)]
pub struct IdentifierCodec {
    generator: Arc<dyn IdGenerator>,
    conversions: Arc<ConversionService>,
}

impl IdentifierCodec {
    /// Create a codec from a generator and a conversion registry.
    pub fn new(generator: Arc<dyn IdGenerator>, conversions: Arc<ConversionService>) -> Self {
        Self {
            generator,
            conversions,
        }
    }

    /// The conversion registry used for coercion and key derivation.
    pub fn conversions(&self) -> &ConversionService {
        &self.conversions
    }

    /// Generate a new identifier of type `Id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if a generated UUID cannot be expressed
    /// as `Id`.
    pub fn generate<Id: ContentId>(&self) -> VellumResult<Id> {
        self.coerce(self.generator.generate())
    }

    /// Express a UUID as the declared identifier type.
    pub fn coerce<Id: ContentId>(&self, id: Uuid) -> VellumResult<Id> {
        if let Some(same) = (&id as &dyn Any).downcast_ref::<Id>() {
            return Ok(same.clone());
        }

        if self.conversions.can_convert::<Uuid, Id>() {
            return self.conversions.convert::<Uuid, Id>(&id);
        }

        let fallback = id.to_string();
        fallback.parse::<Id>().map_err(|_| {
            ResolutionError::new(ResolutionErrorKind::Conversion {
                from: type_name::<Uuid>(),
                to: type_name::<Id>(),
            })
            .into()
        })
    }

    /// Derive the backend key addressing `id`.
    ///
    /// Uses the registered `Id -> String` conversion when present, otherwise
    /// the identifier's display form. The mapping is deterministic.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if the conversion fails or yields an
    /// empty key.
    pub fn to_backend_key<Id: ContentId>(&self, id: &Id) -> VellumResult<String> {
        let key = if let Some(key) = (id as &dyn Any).downcast_ref::<String>() {
            key.clone()
        } else if self.conversions.can_convert::<Id, String>() {
            self.conversions.convert::<Id, String>(id)?
        } else {
            id.to_string()
        };

        if key.trim().is_empty() {
            return Err(ResolutionError::new(ResolutionErrorKind::InvalidKey {
                key,
                reason: "key is empty".to_string(),
            })
            .into());
        }
        Ok(key)
    }
}

impl Default for IdentifierCodec {
    fn default() -> Self {
        Self::new(
            Arc::new(RandomIdGenerator),
            Arc::new(ConversionService::default()),
        )
    }
}

impl std::fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCodec")
            .field("conversions", &self.conversions)
            .finish_non_exhaustive()
    }
}
