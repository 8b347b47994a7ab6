// src/app/topbar.rs
use eframe::egui as eg;

use crate::api::ListKind;

impl crate::app::ShellApp {
    // ---------- TOP BAR ----------
    pub(crate) fn ui_render_topbar(&mut self, ui: &mut eg::Ui) {
        let idle = !self.coord.is_busy();
        let mut wanted: Option<ListKind> = None;

        ui.horizontal(|ui| {
            // List kind
            ui.add_enabled_ui(idle, |ui| {
                eg::ComboBox::from_id_source("list_kind_combo")
                    .selected_text(self.current.label())
                    .show_ui(ui, |ui| {
                        for kind in ListKind::BROWSABLE {
                            let selected = self.current == kind;
                            if ui.selectable_label(selected, kind.label()).clicked() && !selected {
                                wanted = Some(kind);
                            }
                        }
                    });
            });

            ui.separator();

            // Search
            let resp = ui.add_enabled(
                idle,
                eg::TextEdit::singleline(&mut self.search_query)
                    .hint_text("Title…")
                    .desired_width(180.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(eg::Key::Enter));
            let can_search = idle && !self.search_query.trim().is_empty();
            if ui.add_enabled(can_search, eg::Button::new("Search")).clicked()
                || (submitted && can_search)
            {
                wanted = Some(ListKind::Search(self.search_query.clone()));
            }

            ui.separator();

            if ui.add_enabled(idle, eg::Button::new("Refresh")).clicked() {
                wanted = Some(self.current.clone());
            }

            if !idle {
                ui.add(eg::Spinner::new());
                if let Some(task) = self.coord.current_task() {
                    ui.label(eg::RichText::new(task).weak());
                }
                if ui
                    .small_button("Cancel")
                    .on_hover_text("Stop the running request (Esc)")
                    .clicked()
                {
                    self.coord.stop();
                }
            }

            ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                ui.checkbox(&mut self.use_timeout, "Timeout")
                    .on_hover_text("Give up on requests after the configured timeout");
            });
        });

        if let Some(kind) = wanted {
            self.start_fetch(kind);
        }
    }

    pub(crate) fn ui_render_status(&mut self, ui: &mut eg::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.status);
            if let Some(at) = self.updated_at {
                ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                    ui.label(
                        eg::RichText::new(format!("Updated {}", at.format("%H:%M:%S"))).weak(),
                    );
                });
            }
        });
    }
}
