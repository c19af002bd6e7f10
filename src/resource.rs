//! The lifecycle contract every pooled resource implements

use std::collections::HashMap;

use crate::errors::ResourceError;

/// Parameters handed verbatim to every lifecycle call
pub type Params = HashMap<String, String>;

/// A resource the pool can create, health-check and tear down
///
/// The pool never looks inside a resource. It calls [`initialize`](Resource::initialize)
/// once after construction, [`check`](Resource::check) during health sweeps and
/// (optionally) on acquire, and [`dispose`](Resource::dispose) when the resource
/// is shed or the pool shuts down.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{Params, Resource, ResourceError};
///
/// struct Connection {
///     open: bool,
/// }
///
/// impl Resource for Connection {
///     fn initialize(&mut self, params: &Params) -> Result<(), ResourceError> {
///         if !params.contains_key("host") {
///             return Err(ResourceError::new("missing host"));
///         }
///         self.open = true;
///         Ok(())
///     }
///
///     fn check(&mut self, _params: &Params) -> Result<(), ResourceError> {
///         if self.open { Ok(()) } else { Err(ResourceError::new("closed")) }
///     }
///
///     fn dispose(&mut self, _params: &Params) -> Result<(), ResourceError> {
///         self.open = false;
///         Ok(())
///     }
/// }
///
/// let mut params = Params::new();
/// params.insert("host".to_string(), "127.0.0.1".to_string());
///
/// let mut conn = Connection { open: false };
/// assert!(conn.initialize(&params).is_ok());
/// assert!(conn.check(&params).is_ok());
/// ```
pub trait Resource: Send + 'static {
    /// Prepare a freshly constructed resource for use
    fn initialize(&mut self, params: &Params) -> Result<(), ResourceError>;

    /// Verify the resource is still usable
    fn check(&mut self, params: &Params) -> Result<(), ResourceError>;

    /// Release whatever the resource holds
    fn dispose(&mut self, params: &Params) -> Result<(), ResourceError>;
}
