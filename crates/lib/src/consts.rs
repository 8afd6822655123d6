//! Well-known names and defaults shared across the crate.

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "repatch.json";

/// Default repository manifest, relative to the configuration directory.
pub const REPOSITORY_FILENAME: &str = "installed.json";

/// Default directory holding installed packages.
pub const VENDOR_DIR: &str = "vendor";

/// Default directory holding unpatched copies of packages, used for resets.
pub const PRISTINE_DIR: &str = ".repatch/pristine";

/// Source recorded for patches declared directly in the configuration file.
pub const ROOT_SOURCE: &str = "root";

/// Strip levels tried, in order, when a patch does not force one.
pub const DEFAULT_PATCH_LEVELS: &[&str] = &["-p1", "-p0", "-p2"];
