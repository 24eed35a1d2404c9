//! Main application window

use gpdict_config::Config;
use gpdict_core::{ChoiceSource, LookupView, TableSource};
use gtk4::gio::{Menu, SimpleAction};
use gtk4::prelude::*;
use gtk4::{
    Application, Box, DropDown, Label, ListBox, ListBoxRow, Orientation, Paned, ScrolledWindow,
    SearchEntry, StringList, TextView, WrapMode,
};
use libadwaita::prelude::*;
use libadwaita::{ApplicationWindow, HeaderBar, WindowTitle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{app, dialogs, download_dialog};

/// Main application window
pub struct MainWindow {
    window: ApplicationWindow,
    view: RefCell<LookupView>,
    dict_dropdown: DropDown,
    search: SearchEntry,
    results: ListBox,
    word_label: Label,
    entry_view: TextView,
    /// Set while widgets are refilled from the view
    refreshing: Cell<bool>,
}

impl MainWindow {
    pub fn new(app: &Application, config: &Config) -> Rc<Self> {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("gpdict")
            .default_width(config.appearance.window_width)
            .default_height(config.appearance.window_height)
            .build();

        // Header bar
        let header = HeaderBar::new();
        let title = WindowTitle::new("gpdict", "");
        header.set_title_widget(Some(&title));

        let dict_dropdown = DropDown::builder()
            .model(&StringList::new(&[]))
            .tooltip_text("Dictionary")
            .build();
        header.pack_start(&dict_dropdown);

        let menu = Menu::new();
        menu.append(Some("_Download Dictionaries"), Some("win.download"));
        menu.append(Some("_About gpdict"), Some("win.about"));

        let menu_btn = gtk4::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .tooltip_text("Menu")
            .menu_model(&menu)
            .build();
        header.pack_end(&menu_btn);

        // Search
        let search = SearchEntry::builder()
            .placeholder_text("Look up a word")
            .hexpand(true)
            .build();
        search.set_margin_top(6);
        search.set_margin_bottom(6);
        search.set_margin_start(6);
        search.set_margin_end(6);

        // Results list
        let results = ListBox::new();
        results.add_css_class("navigation-sidebar");
        results.set_selection_mode(gtk4::SelectionMode::Single);

        let results_scrolled = ScrolledWindow::new();
        results_scrolled.set_child(Some(&results));
        results_scrolled.set_min_content_width(160);

        // Entry pane
        let word_label = Label::new(None);
        word_label.add_css_class("title-2");
        word_label.set_xalign(0.0);
        word_label.set_selectable(true);

        let entry_view = TextView::builder()
            .editable(false)
            .cursor_visible(false)
            .wrap_mode(WrapMode::WordChar)
            .vexpand(true)
            .build();

        let entry_scrolled = ScrolledWindow::new();
        entry_scrolled.set_child(Some(&entry_view));
        entry_scrolled.set_vexpand(true);

        let entry_box = Box::new(Orientation::Vertical, 8);
        entry_box.set_margin_start(12);
        entry_box.set_margin_end(12);
        entry_box.set_margin_top(6);
        entry_box.append(&word_label);
        entry_box.append(&entry_scrolled);

        let paned = Paned::new(Orientation::Horizontal);
        paned.set_start_child(Some(&results_scrolled));
        paned.set_end_child(Some(&entry_box));
        paned.set_position(180);
        paned.set_shrink_start_child(false);
        paned.set_vexpand(true);

        let main_box = Box::new(Orientation::Vertical, 0);
        main_box.append(&header);
        main_box.append(&search);
        main_box.append(&paned);
        window.set_content(Some(&main_box));

        app.set_accels_for_action("win.download", &["<Primary>d"]);

        let main = Rc::new(Self {
            window,
            view: RefCell::new(LookupView::with_stardict()),
            dict_dropdown,
            search,
            results,
            word_label,
            entry_view,
            refreshing: Cell::new(false),
        });

        main.setup_actions();
        main.setup_signals();
        main.load_dictionaries(config);
        main
    }

    fn setup_actions(self: &Rc<Self>) {
        let download_action = SimpleAction::new("download", None);
        let main = self.clone();
        download_action.connect_activate(move |_, _| {
            let main_for_reload = main.clone();
            download_dialog::show_download_dialog(&main.window, move || {
                main_for_reload.reload_dictionaries();
            });
        });
        self.window.add_action(&download_action);

        let about_action = SimpleAction::new("about", None);
        let win_for_about = self.window.clone();
        about_action.connect_activate(move |_, _| {
            dialogs::show_about_dialog(&win_for_about);
        });
        self.window.add_action(&about_action);
    }

    fn setup_signals(self: &Rc<Self>) {
        let main = self.clone();
        self.dict_dropdown.connect_selected_notify(move |dropdown| {
            if main.refreshing.get() {
                return;
            }
            let Ok(idx) = usize::try_from(dropdown.selected()) else {
                return;
            };
            main.select_dictionary(idx);
        });

        let main = self.clone();
        self.search.connect_search_changed(move |entry| {
            if let Err(e) = main.view.borrow_mut().lookup(&entry.text()) {
                tracing::warn!("Lookup failed: {}", e);
            }
            main.refresh_results();
        });

        let main = self.clone();
        self.results.connect_row_selected(move |_, row| {
            if main.refreshing.get() {
                return;
            }
            let Some(idx) = row.and_then(|r| usize::try_from(r.index()).ok()) else {
                return;
            };
            main.view.borrow_mut().show_hit(idx);
            main.refresh_entry();
        });

        self.window.connect_close_request(|window| {
            let (width, height) = window.default_size();
            app::update_config(|config| {
                config.appearance.window_width = width;
                config.appearance.window_height = height;
            });
            gtk4::glib::Propagation::Proceed
        });
    }

    /// Rescan installed dictionaries and reopen the selected one
    pub fn reload_dictionaries(&self) {
        self.load_dictionaries(&app::current_config());
    }

    fn load_dictionaries(&self, config: &Config) {
        let dictionaries = app::scan_dictionaries(config);

        let result = self
            .view
            .borrow_mut()
            .set_dictionaries(dictionaries, config.dictionaries.last_used.as_deref());
        if let Err(e) = result {
            tracing::error!("Failed to open dictionary: {}", e);
        }

        self.refresh_dictionaries();
        self.refresh_results();
    }

    fn select_dictionary(&self, idx: usize) {
        let name = {
            let mut view = self.view.borrow_mut();
            if !view.set_selected(idx) {
                return;
            }
            view.label(idx).map(str::to_string)
        };

        if let Some(name) = name {
            app::update_config(|config| config.dictionaries.last_used = Some(name));
        }
        self.search.set_sensitive(self.view.borrow().accepts_input());
        self.refresh_results();
    }

    fn refresh_dictionaries(&self) {
        let (labels, selected, accepts_input) = {
            let view = self.view.borrow();
            let labels: Vec<String> = view.labels().into_iter().map(str::to_string).collect();
            (labels, view.selected(), view.accepts_input())
        };

        self.refreshing.set(true);
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        self.dict_dropdown.set_model(Some(&StringList::new(&labels)));
        match selected.and_then(|idx| u32::try_from(idx).ok()) {
            Some(idx) => self.dict_dropdown.set_selected(idx),
            None => self.dict_dropdown.set_selected(gtk4::INVALID_LIST_POSITION),
        }
        self.refreshing.set(false);

        self.dict_dropdown.set_sensitive(!labels.is_empty());
        self.search.set_sensitive(accepts_input);
        if labels.is_empty() {
            self.search
                .set_placeholder_text(Some("No dictionaries, download one from the menu"));
        } else {
            self.search.set_placeholder_text(Some("Look up a word"));
        }
    }

    fn refresh_results(&self) {
        let words: Vec<String> = {
            let view = self.view.borrow();
            let table = view.results_table();
            (0..table.row_count())
                .filter_map(|row| table.cell(row, 0).map(str::to_string))
                .collect()
        };

        self.refreshing.set(true);
        while let Some(row) = self.results.first_child() {
            self.results.remove(&row);
        }
        for word in &words {
            let label = Label::new(Some(word));
            label.set_xalign(0.0);
            label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
            let row = ListBoxRow::new();
            row.set_child(Some(&label));
            self.results.append(&row);
        }
        if let Some(first) = self.results.row_at_index(0) {
            self.results.select_row(Some(&first));
        }
        self.refreshing.set(false);

        self.refresh_entry();
    }

    fn refresh_entry(&self) {
        let view = self.view.borrow();
        self.word_label.set_text(view.displayed_word().unwrap_or(""));
        self.entry_view
            .buffer()
            .set_text(&view.displayed_text().unwrap_or_default());
    }

    pub fn present(&self) {
        self.window.present();
    }

    pub fn widget(&self) -> &ApplicationWindow {
        &self.window
    }
}
