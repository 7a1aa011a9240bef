use eframe::egui;
use services::ConfigStore;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod markdown;
mod sidebar;
mod state;
mod tabs;
mod utils;

use state::{AppState, Tab};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = ConfigStore::open_default();
    let config = store.load();
    tracing::info!("config loaded from {}", store.path().display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Shandu Research Assistant",
        options,
        Box::new(|_cc| {
            Box::new(ShanduApp {
                state: AppState::new(store, config),
            })
        }),
    )
}

struct ShanduApp {
    state: AppState,
}

impl eframe::App for ShanduApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let s = &mut self.state;

        s.poll_jobs();
        if s.is_busy() {
            // keep polling the worker channel
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("Shandu").size(22.0).strong());
                ui.label(egui::RichText::new("AI research assistant").weak());
                ui.add_space(24.0);
                for tab in Tab::ALL {
                    ui.selectable_value(&mut s.tab, tab, tab.label());
                }
            });
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some((label, started)) = &s.busy {
                    ui.spinner();
                    ui.label(format!("{} {}s", label, started.elapsed().as_secs()));
                } else if let Some(notice) = &s.notice {
                    let color = if notice.is_error {
                        egui::Color32::LIGHT_RED
                    } else {
                        ui.visuals().text_color()
                    };
                    ui.colored_label(color, &notice.text);
                } else {
                    ui.label(egui::RichText::new("Ready").weak());
                }
            });
        });

        egui::SidePanel::left("providers")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| sidebar::render_sidebar(ui, s));

        egui::CentralPanel::default().show(ctx, |ui| match s.tab {
            Tab::Research => tabs::render_research_tab(ui, s),
            Tab::Search => tabs::render_search_tab(ui, s),
            Tab::History => tabs::render_history_tab(ui, s),
            Tab::Tools => tabs::render_tools_tab(ui, s),
        });
    }
}
