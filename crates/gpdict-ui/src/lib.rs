//! # gpdict UI
//!
//! GTK4/libadwaita user interface for gpdict.
//!
//! Layout:
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ [WordNet ▾]            gpdict                ☰   │
//! ├──────────────────────────────────────────────────┤
//! │ 🔍 house                                          │
//! ├──────────────┬───────────────────────────────────┤
//! │ house        │ house                             │
//! │ house        │ a dwelling that serves as living  │
//! │              │ quarters for one or more families │
//! └──────────────┴───────────────────────────────────┘
//! ```

pub mod app;
pub mod dialogs;
pub mod download_dialog;
pub mod window;

pub use app::{scan_dictionaries, StartupOptions};

use gtk4::gio;
use gtk4::prelude::*;
use gtk4::{glib, Application};

/// Application ID
pub const APP_ID: &str = "org.gfxprim.gpdict";

/// Initialize and run the application
pub fn run(options: StartupOptions) -> glib::ExitCode {
    if let Err(e) = gtk4::init().and_then(|_| libadwaita::init()) {
        tracing::error!("Failed to initialize GTK: {}", e);
        return glib::ExitCode::FAILURE;
    }

    let app = Application::builder()
        .application_id(APP_ID)
        .flags(gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app::set_startup_options(options);
    app.connect_activate(app::build_ui);

    // Command line is parsed by the binary, GApplication only gets argv[0]
    let argv0: Vec<String> = std::env::args().take(1).collect();
    app.run_with_args(&argv0)
}

/// Application version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
