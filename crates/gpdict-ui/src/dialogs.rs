//! Dialog windows (about, alerts)

use gpdict_core::DialogHost;
use gtk4::prelude::*;
use gtk4::Window;
use libadwaita::prelude::*;

/// Show the about dialog
pub fn show_about_dialog(parent: &impl IsA<Window>) {
    let dialog = libadwaita::AboutWindow::builder()
        .application_name("gpdict")
        .application_icon("accessories-dictionary")
        .developer_name("Cyril Hrubis")
        .version(crate::version())
        .website("https://github.com/gfxprim/gpdict")
        .license_type(gtk4::License::Gpl20)
        .comments("StarDict dictionary lookup with a dictionary downloader.")
        .transient_for(parent)
        .build();

    dialog.present();
}

/// Show a message with a single dismiss button
pub fn show_alert<W>(parent: &W, heading: &str, body: &str)
where
    W: IsA<gtk4::Widget>,
{
    let dialog = libadwaita::AlertDialog::builder()
        .heading(heading)
        .body(body)
        .build();

    dialog.add_response("ok", "OK");
    dialog.set_default_response(Some("ok"));
    dialog.set_close_response("ok");

    dialog.present(Some(parent));
}

/// [`DialogHost`] backed by alert dialogs
pub struct GtkHost {
    parent: Window,
    on_reload: Box<dyn Fn()>,
}

impl GtkHost {
    pub fn new(parent: &impl IsA<Window>, on_reload: impl Fn() + 'static) -> Self {
        Self {
            parent: parent.clone().upcast(),
            on_reload: Box::new(on_reload),
        }
    }

    /// Alerts are shown on top of `parent` from now on
    pub fn set_parent(&mut self, parent: &impl IsA<Window>) {
        self.parent = parent.clone().upcast();
    }
}

impl DialogHost for GtkHost {
    fn show_warning(&self, title: &str, message: &str) {
        tracing::warn!("{}: {}", title, message);
        show_alert(&self.parent, title, message);
    }

    fn show_error(&self, title: &str, message: &str) {
        tracing::error!("{}: {}", title, message);
        show_alert(&self.parent, title, message);
    }

    fn reload_dictionaries(&self) {
        (self.on_reload)();
    }
}
