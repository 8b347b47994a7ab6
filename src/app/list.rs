// src/app/list.rs
use eframe::egui as eg;

impl crate::app::ShellApp {
    pub(crate) fn ui_render_list(&mut self, ui: &mut eg::Ui) {
        if self.items.is_empty() {
            ui.centered_and_justified(|ui| {
                if self.coord.is_busy() {
                    ui.add(eg::Spinner::new().size(24.0));
                } else {
                    ui.label(eg::RichText::new("Nothing to show yet.").weak());
                }
            });
            return;
        }

        eg::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (i, item) in self.items.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(eg::RichText::new(format!("{:>2}.", i + 1)).monospace().weak());
                        let title = match item.year {
                            Some(y) => format!("{} ({})", item.title, y),
                            None => item.title.clone(),
                        };
                        ui.label(eg::RichText::new(title).strong());
                        if let Some(slug) = &item.slug {
                            ui.label(eg::RichText::new(slug).small().weak());
                        }
                    });
                }
            });
    }
}
