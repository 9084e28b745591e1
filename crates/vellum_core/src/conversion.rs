//! Explicit per-pair value conversions.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use uuid::Uuid;
use vellum_error::{ResolutionError, ResolutionErrorKind, VellumResult};

type Converter = Box<dyn Fn(&dyn Any) -> VellumResult<Box<dyn Any + Send>> + Send + Sync>;

/// Registry of conversions between concrete types.
///
/// Each conversion is registered for one `(From, To)` pair at startup; there
/// is no reflective fallback. The default registry covers the identifier
/// pairings the store needs out of the box.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use vellum_core::ConversionService;
///
/// let conversions = ConversionService::default();
/// assert!(conversions.can_convert::<Uuid, String>());
/// assert!(!conversions.can_convert::<Uuid, i64>());
///
/// let id = Uuid::nil();
/// let key: String = conversions.convert(&id).unwrap();
/// assert_eq!(key, "00000000-0000-0000-0000-000000000000");
/// ```
pub struct ConversionService {
    converters: HashMap<(TypeId, TypeId), Converter>,
}

impl ConversionService {
    /// A registry with no conversions.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Register the conversion from `F` to `T`, replacing any previous one.
    pub fn register<F, T>(
        &mut self,
        convert: impl Fn(&F) -> VellumResult<T> + Send + Sync + 'static,
    ) -> &mut Self
    where
        F: 'static,
        T: Send + 'static,
    {
        let converter: Converter = Box::new(move |value: &dyn Any| {
            let value = value.downcast_ref::<F>().ok_or_else(|| {
                ResolutionError::new(ResolutionErrorKind::Conversion {
                    from: type_name::<F>(),
                    to: type_name::<T>(),
                })
            })?;
            Ok(Box::new(convert(value)?) as Box<dyn Any + Send>)
        });
        tracing::trace!(from = type_name::<F>(), to = type_name::<T>(), "Registered conversion");
        self.converters
            .insert((TypeId::of::<F>(), TypeId::of::<T>()), converter);
        self
    }

    /// Whether a conversion from `F` to `T` is registered.
    pub fn can_convert<F: 'static, T: 'static>(&self) -> bool {
        self.converters
            .contains_key(&(TypeId::of::<F>(), TypeId::of::<T>()))
    }

    /// Convert `value` with the registered `F` to `T` conversion.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when no conversion is registered or the
    /// conversion rejects the value.
    pub fn convert<F: 'static, T: 'static>(&self, value: &F) -> VellumResult<T> {
        let unsupported = || {
            ResolutionError::new(ResolutionErrorKind::Conversion {
                from: type_name::<F>(),
                to: type_name::<T>(),
            })
        };

        let converter = self
            .converters
            .get(&(TypeId::of::<F>(), TypeId::of::<T>()))
            .ok_or_else(unsupported)?;

        let converted = converter(value)?;
        converted
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| unsupported().into())
    }
}

fn parse_failed(value: &str, target: &str, err: impl std::fmt::Display) -> ResolutionError {
    ResolutionError::new(ResolutionErrorKind::ConversionFailed(format!(
        "'{}' is not a valid {}: {}",
        value, target, err
    )))
}

impl Default for ConversionService {
    /// Uuid, string and integer identifier pairings.
    fn default() -> Self {
        let mut service = Self::empty();
        service
            .register::<Uuid, String>(|id| Ok(id.hyphenated().to_string()))
            .register::<String, Uuid>(|s| {
                Uuid::parse_str(s).map_err(|e| parse_failed(s, "uuid", e).into())
            })
            .register::<Uuid, u128>(|id| Ok(id.as_u128()))
            .register::<i64, String>(|n| Ok(n.to_string()))
            .register::<u64, String>(|n| Ok(n.to_string()))
            .register::<String, i64>(|s| {
                s.parse::<i64>()
                    .map_err(|e| parse_failed(s, "i64", e).into())
            })
            .register::<String, u64>(|s| {
                s.parse::<u64>()
                    .map_err(|e| parse_failed(s, "u64", e).into())
            });
        service
    }
}

impl std::fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionService")
            .field("conversions", &self.converters.len())
            .finish()
    }
}
