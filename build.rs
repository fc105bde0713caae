// build.rs - Build script for drupal-translations
//
// Sets up the Node-API build environment so the `napi` feature can produce
// a native addon that a webpack plugin loads.

fn main() {
    napi_build::setup();
}
