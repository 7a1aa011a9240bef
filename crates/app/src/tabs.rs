use crate::markdown::render_markdown;
use crate::state::{AppState, MAX_RESULTS, MIN_RESULTS};
use crate::utils::ollama_hints;
use eframe::egui;
use shared::history::HistoryPayload;
use shared::research::{render_hits_markdown, DetailLevel, SearchEngine};
use shared::settings::OLLAMA;

pub fn render_research_tab(ui: &mut egui::Ui, s: &mut AppState) {
    ui.heading("Deep research");
    ui.add_space(4.0);

    ui.label("Research topic");
    let response = ui.add(
        egui::TextEdit::singleline(&mut s.research_query)
            .hint_text("e.g. Solid-state batteries for electric vehicles")
            .desired_width(f32::INFINITY),
    );
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    ui.horizontal(|ui| {
        ui.label("Detail level");
        for level in DetailLevel::ALL {
            ui.radio_value(&mut s.detail, level, level.as_str());
        }
    });

    let (provider, _) = s.config.active();
    let model = s.config.current_model().unwrap_or_else(|| "none".to_string());
    ui.label(
        egui::RichText::new(format!("Using {} with model {}", provider, model))
            .small()
            .weak(),
    );

    ui.add_space(4.0);
    let run = ui
        .add_enabled(!s.is_busy(), egui::Button::new("Start research"))
        .clicked();
    if run || (submitted && !s.is_busy()) {
        s.start_research();
    }

    if let Some(report) = s.report.clone() {
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Save report").clicked() {
                s.save_report();
            }
            if ui.button("Copy").clicked() {
                s.copy_report();
            }
        });
        egui::ScrollArea::vertical()
            .id_source("report")
            .auto_shrink([false, false])
            .show(ui, |ui| render_markdown(ui, &report));
    }
}

pub fn render_search_tab(ui: &mut egui::Ui, s: &mut AppState) {
    ui.heading("Search");
    ui.add_space(4.0);

    let response = ui.add(
        egui::TextEdit::singleline(&mut s.search_query)
            .hint_text("Search the web, Wikipedia and ArXiv")
            .desired_width(f32::INFINITY),
    );
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    ui.horizontal(|ui| {
        ui.label("Engines");
        for engine in SearchEngine::ALL {
            let mut on = s.engines.contains(&engine);
            if ui.checkbox(&mut on, engine.display_name()).changed() {
                if on {
                    s.engines.push(engine);
                } else {
                    s.engines.retain(|e| *e != engine);
                }
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Results per engine");
        ui.add(egui::Slider::new(&mut s.max_results, MIN_RESULTS..=MAX_RESULTS));
    });

    let (provider, _) = s.config.active();
    ui.add_enabled(
        provider == OLLAMA,
        egui::Checkbox::new(&mut s.ai_summary, "Summarize each result with the local model"),
    )
    .on_disabled_hover_text("Available when Ollama is the active provider");

    let run = ui
        .add_enabled(!s.is_busy(), egui::Button::new("Search"))
        .clicked();
    if run || (submitted && !s.is_busy()) {
        s.start_search();
    }

    for warning in &s.search_warnings {
        ui.colored_label(egui::Color32::from_rgb(210, 140, 40), warning);
    }

    if s.searched {
        ui.separator();
        let markdown = render_hits_markdown(&s.hits);
        egui::ScrollArea::vertical()
            .id_source("hits")
            .auto_shrink([false, false])
            .show(ui, |ui| render_markdown(ui, &markdown));
    }
}

pub fn render_history_tab(ui: &mut egui::Ui, s: &mut AppState) {
    ui.heading("History");
    ui.label(
        egui::RichText::new("Kept for this session only")
            .small()
            .weak(),
    );
    ui.add_space(4.0);

    if s.history.is_empty() {
        ui.label("No research or searches yet.");
        return;
    }

    let mut delete = None;
    egui::ScrollArea::vertical()
        .id_source("history")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (number, entry) in s.history.newest_first() {
                egui::CollapsingHeader::new(entry.title(number))
                    .id_source(entry.id)
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
                                .small()
                                .weak(),
                        );
                        if let HistoryPayload::Hits(hits) = &entry.payload {
                            ui.label(format!("{} results", hits.len()));
                        }
                        render_markdown(ui, &entry.payload.to_markdown());
                        if ui.button("Delete").clicked() {
                            delete = Some(entry.id);
                        }
                    });
            }
        });

    if let Some(id) = delete {
        s.history.remove(id);
    }
}

pub fn render_tools_tab(ui: &mut egui::Ui, s: &mut AppState) {
    ui.heading("Ollama");
    ui.label(format!(
        "Server: {}",
        s.config
            .provider(OLLAMA)
            .map(|p| p.base_url.as_str())
            .unwrap_or(shared::settings::OLLAMA_BASE_URL)
    ));
    ui.add_space(4.0);

    if ui
        .add_enabled(!s.is_busy(), egui::Button::new("Check connection"))
        .clicked()
    {
        s.start_probe();
    }

    match &s.probe {
        None => {}
        Some(Ok(models)) if models.is_empty() => {
            ui.colored_label(egui::Color32::from_rgb(210, 140, 40), "Connected, but no models are installed.");
            ui.label("Pull one with `ollama pull llama3`.");
        }
        Some(Ok(models)) => {
            ui.colored_label(
                egui::Color32::from_rgb(60, 170, 90),
                format!("Connected. {} models available.", models.len()),
            );
            let categories = providers::categorize_models(models);
            for (group, names) in categories.groups() {
                if names.is_empty() {
                    continue;
                }
                ui.label(egui::RichText::new(group).strong());
                for name in names {
                    ui.label(egui::RichText::new(format!("  {}", name)).monospace());
                }
            }
        }
        Some(Err(e)) => {
            ui.colored_label(egui::Color32::LIGHT_RED, e.to_string());
            ui.label("Try the following:");
            for hint in ollama_hints(e) {
                ui.label(format!("  •  {}", hint));
            }
        }
    }

    let models = match &s.probe {
        Some(Ok(models)) if !models.is_empty() => models.clone(),
        _ => return,
    };

    ui.separator();
    ui.heading("Test a model");
    egui::ComboBox::from_id_source("test_model")
        .selected_text(s.test_model.as_str())
        .show_ui(ui, |ui| {
            for m in &models {
                ui.selectable_value(&mut s.test_model, m.clone(), m);
            }
        });
    ui.add(
        egui::TextEdit::multiline(&mut s.test_prompt)
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    if ui
        .add_enabled(!s.is_busy(), egui::Button::new("Run test"))
        .clicked()
    {
        s.start_model_test();
    }
    match &s.test_output {
        Some(Ok(text)) => {
            ui.separator();
            render_markdown(ui, text);
        }
        Some(Err(e)) => {
            ui.colored_label(egui::Color32::LIGHT_RED, e);
        }
        None => {}
    }
}
