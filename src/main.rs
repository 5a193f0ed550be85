//! Wayfarer entry point
//!
//! Native builds run the headless console driver over stdin, saving to
//! `WAYFARER_SAVE_DIR` (default `./save`). The web build starts from
//! `platform::web` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::io::{self, Write};
    use std::sync::Arc;

    use wayfarer::persistence::{BackgroundStore, FileStore};
    use wayfarer::platform::console;
    use wayfarer::sim::SceneRegistry;
    use wayfarer::{Session, Tuning};

    env_logger::init();
    log::info!("Wayfarer (native) starting...");

    let registry = match SceneRegistry::builtin() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            log::error!("Scene data is invalid: {}", e);
            std::process::exit(1);
        }
    };

    let save_dir = std::env::var_os("WAYFARER_SAVE_DIR").unwrap_or_else(|| "save".into());
    log::info!("Saving to {}", save_dir.to_string_lossy());
    let store = BackgroundStore::new(FileStore::new(save_dir));

    let mut session = Session::new(registry, Tuning::load(), store);
    session.initialize();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    if let Err(e) = console::run(&mut session, stdin.lock(), &mut stdout) {
        log::error!("Console I/O failed: {}", e);
    }
    if let Err(e) = stdout.flush() {
        log::warn!("Could not flush output: {}", e);
    }

    if let Err(e) = session.store().flush() {
        log::warn!("Final save flush failed: {}", e);
    }
    log::info!("Bye");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
