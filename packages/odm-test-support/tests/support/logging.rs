//! Installs the shared test logger once per integration test binary.
//! Set `TEST_LOG=debug` to see the module's `odm_module=*` events.

#[ctor::ctor]
fn _auto_init_for_integration_tests() {
    odm_test_support::logging::init();
}
