//! Dictionary download dialog
//!
//! Lists the catalog, downloads the selected archive with a progress bar
//! and unpacks it into the install directory.

use gpdict_core::{
    CoreError, DialogHost, DialogResult, DownloadDialog, DownloadProgress, TableSource,
};
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::{Box, Button, Label, ListBox, ListBoxRow, Orientation, ProgressBar, ScrolledWindow};
use libadwaita::prelude::*;
use libadwaita::HeaderBar;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app;
use crate::dialogs::{self, GtkHost};

/// Width in characters of the non-URL columns
const SHORT_COLUMN_CHARS: i32 = 10;

/// Open the download dialog on top of `parent`
///
/// `on_reload` runs once a dictionary has been installed. Nothing is shown
/// but a warning when no catalog is available.
pub fn show_download_dialog<W>(parent: &W, on_reload: impl Fn() + 'static)
where
    W: IsA<gtk4::Window> + IsA<gtk4::Widget>,
{
    let config = app::current_config();

    let installer = match app::build_installer(&config) {
        Ok(installer) => installer,
        Err(e) => {
            tracing::error!("Failed to set up downloads: {}", e);
            dialogs::show_alert(parent, "Download unavailable", &e.to_string());
            return;
        }
    };

    let mut host = GtkHost::new(parent, on_reload);
    let mut state = DownloadDialog::new(app::catalog_sources(&config), installer);
    if !state.open(&host) {
        return;
    }

    let window = libadwaita::Window::builder()
        .transient_for(parent)
        .modal(true)
        .default_width(560)
        .default_height(400)
        .title("Download dictionaries")
        .build();
    host.set_parent(&window);

    // Header bar
    let header = HeaderBar::new();
    let close_btn = Button::with_label("Close");
    let download_btn = Button::with_label("Download");
    download_btn.add_css_class("suggested-action");
    download_btn.set_sensitive(false);
    header.pack_start(&close_btn);
    header.pack_end(&download_btn);

    // Catalog table
    let list = ListBox::new();
    list.add_css_class("boxed-list");
    list.set_selection_mode(gtk4::SelectionMode::Single);
    if let Some(table) = state.table() {
        list.append(&header_row(&table));
        let mut cursor = table.cursor();
        let mut more = cursor.reset();
        while more {
            list.append(&catalog_row(&cursor.row_cells()));
            more = cursor.advance(1);
        }
    }

    let scrolled = ScrolledWindow::new();
    scrolled.set_child(Some(&list));
    scrolled.set_vexpand(true);

    // Progress
    let progress = ProgressBar::new();
    progress.set_show_text(true);
    progress.set_visible(false);

    let status = Label::new(None);
    status.add_css_class("dim-label");
    status.add_css_class("caption");
    status.set_xalign(0.0);
    status.set_wrap(true);

    let body = Box::new(Orientation::Vertical, 8);
    body.set_margin_top(12);
    body.set_margin_bottom(12);
    body.set_margin_start(12);
    body.set_margin_end(12);
    body.append(&scrolled);
    body.append(&progress);
    body.append(&status);

    let content = Box::new(Orientation::Vertical, 0);
    content.append(&header);
    content.append(&body);
    window.set_content(Some(&content));

    let state = Rc::new(RefCell::new(state));
    let host = Rc::new(host);

    // Row 0 is the column header
    list.connect_row_selected({
        let state = state.clone();
        let download_btn = download_btn.clone();
        move |_, row| {
            let Ok(mut state) = state.try_borrow_mut() else {
                return;
            };
            let selected = row
                .and_then(|r| usize::try_from(r.index() - 1).ok())
                .is_some_and(|idx| state.select(idx));
            download_btn.set_sensitive(selected);
        }
    });

    close_btn.connect_clicked({
        let window = window.clone();
        move |_| window.close()
    });

    window.connect_close_request({
        let state = state.clone();
        move |_| {
            // Refuse to close in the middle of a transfer
            let Ok(mut state) = state.try_borrow_mut() else {
                return glib::Propagation::Stop;
            };
            if state.is_open() {
                state.close(DialogResult::Dismissed);
            }
            glib::Propagation::Proceed
        }
    });

    download_btn.connect_clicked({
        let window = window.clone();
        let list = list.clone();
        let close_btn = close_btn.clone();
        move |btn| {
            btn.set_sensitive(false);
            close_btn.set_sensitive(false);
            list.set_sensitive(false);
            progress.set_visible(true);
            progress.set_fraction(0.0);
            progress.set_text(None);
            status.set_text("Downloading...");

            let result = {
                let Ok(mut state) = state.try_borrow_mut() else {
                    return;
                };
                let mut on_progress = |p: DownloadProgress| {
                    match p.fraction() {
                        Some(fraction) => progress.set_fraction(fraction),
                        None => progress.pulse(),
                    }
                    progress.set_text(Some(&format_progress(&p)));
                    let ctx = glib::MainContext::default();
                    while ctx.pending() {
                        ctx.iteration(false);
                    }
                };
                state.trigger_download(host.as_ref() as &dyn DialogHost, &mut on_progress)
            };

            match result {
                Ok(()) => window.close(),
                Err(e) => {
                    if let CoreError::Download(msg) = &e {
                        tracing::error!("Download failed: {}", msg);
                    }
                    status.set_text(&e.to_string());
                    progress.set_visible(false);
                    close_btn.set_sensitive(true);
                    list.set_sensitive(true);
                    btn.set_sensitive(true);
                }
            }
        }
    });

    window.present();
}

fn header_row(table: &impl TableSource) -> ListBoxRow {
    let row = ListBoxRow::new();
    row.set_selectable(false);
    row.set_activatable(false);

    let titles: Vec<&str> = table.columns().iter().map(|c| c.title).collect();
    let row_box = cells_box(&titles);
    for label in labels_of(&row_box) {
        label.add_css_class("heading");
    }
    row.set_child(Some(&row_box));
    row
}

fn catalog_row(cells: &[&str]) -> ListBoxRow {
    let row = ListBoxRow::new();
    row.set_child(Some(&cells_box(cells)));
    row
}

fn cells_box(cells: &[&str]) -> Box {
    let row_box = Box::new(Orientation::Horizontal, 12);
    row_box.set_margin_top(6);
    row_box.set_margin_bottom(6);
    row_box.set_margin_start(8);
    row_box.set_margin_end(8);

    let last = cells.len().saturating_sub(1);
    for (idx, text) in cells.iter().enumerate() {
        let label = Label::new(Some(text));
        label.set_xalign(0.0);
        if idx == last {
            label.set_hexpand(true);
            label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
            label.add_css_class("monospace");
        } else {
            label.set_width_chars(SHORT_COLUMN_CHARS);
        }
        row_box.append(&label);
    }
    row_box
}

fn labels_of(row_box: &Box) -> Vec<Label> {
    let mut labels = Vec::new();
    let mut child = row_box.first_child();
    while let Some(widget) = child {
        child = widget.next_sibling();
        if let Ok(label) = widget.downcast::<Label>() {
            labels.push(label);
        }
    }
    labels
}

/// Progress bar text
fn format_progress(p: &DownloadProgress) -> String {
    match p.total {
        Some(total) => format!("{} / {}", format_size(p.downloaded), format_size(total)),
        None => format_size(p.downloaded),
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}
