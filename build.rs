fn main() {
    // Host builds (tests) have no ESP-IDF toolchain; only emit the
    // esp-idf link/env plumbing for device builds.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
