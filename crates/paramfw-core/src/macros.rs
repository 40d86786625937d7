//! Macros for subsystem plugin crates.

/// Export a subsystem plugin factory entry point.
///
/// The first argument is the exported symbol, which must follow the
/// `get<TYPE>SubsystemBuilder` convention for the plugin's file name. The
/// second is a function `fn(&mut BuilderRegistry, &Logger)` that registers the
/// plugin's builders.
///
/// # Example
///
/// ```rust,ignore
/// use paramfw_core::prelude::*;
///
/// fn register(registry: &mut BuilderRegistry, logger: &Logger<'_>) {
///     registry.register_builder("FOO", Box::new(FooBuilder));
///     logger.info("FOO subsystem builder registered");
/// }
///
/// // In libFoo-subsystem.so
/// paramfw_core::declare_subsystem_plugin!(getFOOSubsystemBuilder, register);
/// ```
#[macro_export]
macro_rules! declare_subsystem_plugin {
    ($symbol:ident, $register:path) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "C" fn $symbol(
            registry: *mut $crate::registry::BuilderRegistry,
            logger: &$crate::log::Logger<'_>,
        ) {
            if let Some(registry) = registry.as_mut() {
                $register(registry, logger);
            }
        }
    };
}
