//! The entity metadata accessor contract.

use std::fmt::{Debug, Display};
use std::str::FromStr;
use vellum_error::VellumResult;

/// A value usable as a content identifier.
///
/// Identifiers are typed on the entity (`Uuid`, `String`, `i64`, ...) but
/// every backend addresses content with a string key, so an identifier must
/// print itself and parse back.
pub trait ContentId: Clone + Debug + Display + FromStr + Send + Sync + 'static {}

impl<T> ContentId for T where T: Clone + Debug + Display + FromStr + Send + Sync + 'static {}

/// Read and write the content metadata carried by an entity.
///
/// An implementation exposes exactly one content identifier and one content
/// length. Accessors fail with a [`MetadataError`](vellum_error::MetadataError)
/// when the entity does not declare the fields.
///
/// # Examples
///
/// ```
/// use vellum_core::ContentMetadata;
/// use vellum_error::VellumResult;
///
/// #[derive(Default)]
/// struct Claim {
///     form_id: Option<String>,
///     form_length: u64,
/// }
///
/// impl ContentMetadata for Claim {
///     type Id = String;
///
///     fn content_id(&self) -> VellumResult<Option<String>> {
///         Ok(self.form_id.clone())
///     }
///
///     fn set_content_id(&mut self, id: Option<String>) -> VellumResult<()> {
///         self.form_id = id;
///         Ok(())
///     }
///
///     fn content_length(&self) -> VellumResult<u64> {
///         Ok(self.form_length)
///     }
///
///     fn set_content_length(&mut self, length: u64) -> VellumResult<()> {
///         self.form_length = length;
///         Ok(())
///     }
/// }
///
/// let mut claim = Claim::default();
/// claim.set_content_id(Some("a1".to_string())).unwrap();
/// assert!(claim.clear_content_id().unwrap());
/// assert_eq!(claim.content_id().unwrap(), None);
/// ```
pub trait ContentMetadata: Send {
    /// Declared type of the content identifier.
    type Id: ContentId;

    /// Current content identifier, `None` when no content is attached.
    fn content_id(&self) -> VellumResult<Option<Self::Id>>;

    /// Overwrite the content identifier.
    fn set_content_id(&mut self, id: Option<Self::Id>) -> VellumResult<()>;

    /// Current content length in bytes.
    fn content_length(&self) -> VellumResult<u64>;

    /// Overwrite the content length.
    fn set_content_length(&mut self, length: u64) -> VellumResult<()>;

    /// Whether the content identifier is also the entity's primary key.
    ///
    /// A record must never lose its own primary key as a side effect of
    /// clearing content.
    fn content_id_is_primary_key(&self) -> bool {
        false
    }

    /// Clear the content identifier unless it is the primary key.
    ///
    /// Returns `true` when the identifier was cleared.
    fn clear_content_id(&mut self) -> VellumResult<bool> {
        if self.content_id_is_primary_key() {
            return Ok(false);
        }
        self.set_content_id(None)?;
        Ok(true)
    }
}
