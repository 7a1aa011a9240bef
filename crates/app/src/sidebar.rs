use crate::state::AppState;
use eframe::egui;
use shared::settings::{self, OLLAMA};

const FREE_COLOR: egui::Color32 = egui::Color32::from_rgb(60, 170, 90);
const PAID_COLOR: egui::Color32 = egui::Color32::from_rgb(210, 140, 40);

pub fn render_sidebar(ui: &mut egui::Ui, s: &mut AppState) {
    ui.add_space(8.0);
    ui.heading("Provider");
    ui.add_space(4.0);

    provider_selector(ui, s);
    ui.separator();

    if s.adding_provider {
        add_provider_form(ui, s);
        return;
    }

    credentials(ui, s);
    ui.separator();
    model_list(ui, s);

    let (active, _) = s.config.active();
    if s.config.is_custom(&active) {
        ui.separator();
        if ui
            .button(egui::RichText::new("Remove provider").color(egui::Color32::LIGHT_RED))
            .clicked()
        {
            s.remove_provider(&active);
        }
    }
}

fn provider_selector(ui: &mut egui::Ui, s: &mut AppState) {
    let (active, _) = s.config.active();
    let names: Vec<String> = s.config.all_providers().into_keys().collect();
    let mut picked: Option<String> = None;
    let mut add = false;

    egui::ComboBox::from_id_source("provider_select")
        .selected_text(if s.adding_provider { "Add provider" } else { active.as_str() })
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for name in &names {
                if ui.selectable_label(*name == active, name).clicked() {
                    picked = Some(name.clone());
                }
            }
            ui.separator();
            if ui.selectable_label(s.adding_provider, "➕ Add provider").clicked() {
                add = true;
            }
        });

    if let Some(name) = picked {
        s.adding_provider = false;
        if name != active {
            s.select_provider(&name);
        }
    }
    if add {
        s.adding_provider = true;
    }
}

fn credentials(ui: &mut egui::Ui, s: &mut AppState) {
    let (active, _) = s.config.active();

    if active != OLLAMA {
        ui.label("API key");
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut s.key_input)
                    .password(!s.show_key)
                    .desired_width(ui.available_width() - 60.0),
            );
            ui.checkbox(&mut s.show_key, "Show");
        });
    }

    ui.label("Base URL");
    ui.add(egui::TextEdit::singleline(&mut s.url_input).desired_width(f32::INFINITY));

    if active != OLLAMA && s.key_input.is_empty() {
        ui.label(
            egui::RichText::new("No API key set")
                .small()
                .color(egui::Color32::LIGHT_RED),
        );
    }
    if ui.button("Save").clicked() {
        s.apply_credentials();
    }
}

fn model_list(ui: &mut egui::Ui, s: &mut AppState) {
    let (active, provider) = s.config.active();
    let current = s.config.current_model();

    ui.heading("Model");
    match &current {
        Some(model) => ui.label(egui::RichText::new(model).monospace()),
        None => ui.label("No model selected"),
    };
    ui.add_space(4.0);

    if provider.models.is_empty() {
        let hint = if active == OLLAMA {
            "No local models yet. Open Tools and check the Ollama connection."
        } else {
            "This provider lists no models."
        };
        ui.label(egui::RichText::new(hint).small().weak());
        return;
    }

    let mut picked: Option<String> = None;
    egui::ScrollArea::vertical()
        .id_source("model_list")
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            for (group, models) in settings::model_groups(&active, &provider.models) {
                egui::CollapsingHeader::new(group)
                    .default_open(true)
                    .show(ui, |ui| {
                        for model in models {
                            ui.horizontal(|ui| {
                                let (badge, color) = if settings::is_free_model(&active, model) {
                                    ("free", FREE_COLOR)
                                } else {
                                    ("paid", PAID_COLOR)
                                };
                                ui.label(egui::RichText::new(badge).small().color(color));
                                ui.label(egui::RichText::new(model).monospace().small());
                                let selected = current.as_deref() == Some(model);
                                if ui
                                    .add_enabled(!selected, egui::Button::new("Select").small())
                                    .clicked()
                                {
                                    picked = Some(model.to_string());
                                }
                            });
                        }
                    });
            }
        });

    if let Some(model) = picked {
        s.select_model(&model);
    }
}

fn add_provider_form(ui: &mut egui::Ui, s: &mut AppState) {
    ui.heading("Add provider");
    ui.label("OpenAI-compatible API");
    ui.add_space(4.0);

    let form = &mut s.new_provider;
    ui.label("Name");
    ui.text_edit_singleline(&mut form.name);
    ui.label("Base URL");
    ui.add(
        egui::TextEdit::singleline(&mut form.base_url).hint_text("https://api.example.com/v1"),
    );
    ui.label("API key");
    ui.add(egui::TextEdit::singleline(&mut form.api_key).password(true));
    ui.label("Models (one per line)");
    ui.add(
        egui::TextEdit::multiline(&mut form.models)
            .desired_rows(4)
            .desired_width(f32::INFINITY),
    );

    ui.horizontal(|ui| {
        if ui.button("Add").clicked() {
            s.add_provider();
        }
        if ui.button("Cancel").clicked() {
            s.adding_provider = false;
        }
    });
}
