//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
pub use actix_web;

/// Generate a `routes` function registering the listed handlers.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route trigger_check,
/// }
/// ```
///
/// Nested modules are mounted with `mount module` and must expose their
/// own `routes` function.
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)? $(; $(mount $module:ident),* $(,)?)?) => {
        pub fn routes(cfg: &mut $crate::actix_web::web::ServiceConfig) {
            $(cfg.service($handler);)*
            $($($module::routes(cfg);)*)?
        }
    };
}
