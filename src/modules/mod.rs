pub mod catalog;

use locallib_kernel::ModuleRegistry;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(catalog::create_module());
}
