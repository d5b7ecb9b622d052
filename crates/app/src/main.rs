use chat_core::ConnectionStatus;
use clap::Parser;
use eframe::egui;
use shared::{Message, MessageKind};
use tracing_subscriber::EnvFilter;

mod config;
mod simple_md;
mod state;
mod utils;
mod widgets;

use state::AppState;
use utils::{file_count_label, format_file_size, truncate_text};

const PREVIEW_CHARS: usize = 200;

/// Chat with a local Ollama model about your own documents.
#[derive(Debug, Parser)]
#[command(name = "doc-chat", version)]
struct Args {
    /// Verbose logging and egui debug overlays
    #[arg(long)]
    dev: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let default_level = if args.dev { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = config::load_settings_or_default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window.width, settings.window.height])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };

    let mut state = AppState::new(settings, args.dev)?;
    state.refresh_server_status();

    eframe::run_native(
        "Doc Chat",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_debug_on_hover(state.debug);
            Box::new(DocChatApp { state })
        }),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {}", e))
}

struct DocChatApp {
    state: AppState,
}

impl eframe::App for DocChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let s = &mut self.state;
        s.poll();
        if s.is_busy() {
            ctx.request_repaint();
        }

        let dark = s.settings.window.dark_mode;
        apply_theme(ctx, dark);

        render_header(ctx, s, dark);
        render_context_panel(ctx, s, dark);
        render_input_bar(ctx, s);
        render_chat(ctx, s, dark);
        render_loading_overlay(ctx, s);
    }
}

fn apply_theme(ctx: &egui::Context, dark: bool) {
    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    if dark {
        style.visuals = egui::Visuals::dark();
        style.visuals.panel_fill = egui::Color32::from_rgb(30, 30, 35);
    } else {
        style.visuals = egui::Visuals::light();
        style.visuals.panel_fill = egui::Color32::from_rgb(250, 250, 252);
    }
    ctx.set_style(style);
}

fn render_header(ctx: &egui::Context, s: &mut AppState, dark: bool) {
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("Doc Chat").size(22.0));
            ui.add_space(24.0);

            ui.label("Model:");
            let current = s.session.selected_model().to_string();
            let mut chosen = current.clone();
            let models = s.session.available_models().to_vec();
            egui::ComboBox::from_id_source("model_select")
                .selected_text(&current)
                .show_ui(ui, |ui| {
                    if models.is_empty() {
                        ui.selectable_value(&mut chosen, current.clone(), &current);
                    }
                    for model in &models {
                        ui.selectable_value(&mut chosen, model.clone(), model);
                    }
                });
            if chosen != current {
                s.select_model(chosen);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .small_button("⟳")
                    .on_hover_text("Check connection again")
                    .clicked()
                {
                    s.refresh_server_status();
                }
                let status = s.session.connection();
                let color = match status {
                    ConnectionStatus::Connected => egui::Color32::from_rgb(90, 200, 120),
                    ConnectionStatus::Checking => egui::Color32::from_rgb(220, 180, 90),
                    ConnectionStatus::Disconnected(_) => egui::Color32::from_rgb(220, 90, 90),
                };
                ui.label(egui::RichText::new(status.label()).color(if dark {
                    egui::Color32::from_gray(200)
                } else {
                    egui::Color32::from_gray(60)
                }));
                ui.label(egui::RichText::new("●").color(color));
            });
        });
        ui.add_space(8.0);
    });
}

fn render_context_panel(ctx: &egui::Context, s: &mut AppState, dark: bool) {
    egui::SidePanel::left("context")
        .resizable(true)
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.heading("Context");
            ui.add_enabled_ui(!s.is_loading(), |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Select Files").clicked() {
                        s.select_files();
                    }
                    if ui.button("Select Folder").clicked() {
                        s.select_folder();
                    }
                    if ui.button("Clear").clicked() {
                        s.clear_context();
                    }
                });
            });

            ui.horizontal(|ui| {
                ui.label(file_count_label(s.store.len()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format_file_size(s.store.total_size()));
                });
            });
            ui.separator();

            if s.store.is_empty() {
                ui.label(
                    egui::RichText::new(
                        "No files loaded. Select files or a folder to add context.",
                    )
                    .italics(),
                );
                return;
            }

            let card_fill = if dark {
                egui::Color32::from_rgb(42, 42, 50)
            } else {
                egui::Color32::from_rgb(238, 240, 244)
            };
            let mut remove_index = None;
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for (index, item) in s.store.iter().enumerate() {
                        egui::Frame::none()
                            .fill(card_fill)
                            .rounding(egui::Rounding::same(8.0))
                            .inner_margin(egui::Margin::same(8.0))
                            .show(ui, |ui| {
                                ui.set_width(ui.available_width());
                                ui.horizontal(|ui| {
                                    ui.label(egui::RichText::new(&item.name).strong())
                                        .on_hover_text(&item.path);
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| {
                                            if ui
                                                .small_button("×")
                                                .on_hover_text("Remove file")
                                                .clicked()
                                            {
                                                remove_index = Some(index);
                                            }
                                        },
                                    );
                                });
                                ui.label(
                                    egui::RichText::new(format_file_size(item.size)).small(),
                                );
                                ui.label(
                                    egui::RichText::new(truncate_text(
                                        &item.content,
                                        PREVIEW_CHARS,
                                    ))
                                    .small()
                                    .weak(),
                                );
                            });
                        ui.add_space(4.0);
                    }
                });
            if let Some(index) = remove_index {
                s.remove_context(index);
            }
        });
}

fn render_input_bar(ctx: &egui::Context, s: &mut AppState) {
    egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
        ui.add_space(8.0);
        let input_id = egui::Id::new("chat_input");

        // Enter sends, Shift+Enter inserts a newline
        let enter_pressed = ui.memory(|m| m.has_focus(input_id))
            && !ui.input(|i| i.modifiers.shift)
            && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));

        ui.horizontal(|ui| {
            ui.add_sized(
                [ui.available_width() - 80.0, 48.0],
                egui::TextEdit::multiline(&mut s.input_text)
                    .id(input_id)
                    .desired_rows(2)
                    .hint_text("Ask a question about your documents..."),
            );
            let send = ui.add_enabled_ui(s.can_send(), |ui| {
                ui.add_sized([70.0, 48.0], egui::Button::new("Send"))
            });
            if send.inner.clicked() || enter_pressed {
                s.send_message();
            }
        });
        ui.add_space(8.0);
    });
}

fn render_chat(ctx: &egui::Context, s: &AppState, dark: bool) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if s.session.transcript().is_empty() {
                    ui.add_space(40.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("Welcome");
                        ui.label(
                            "Load some documents on the left, then ask a question about them.",
                        );
                    });
                }
                for (i, msg) in s.session.transcript().iter().enumerate() {
                    let pending = s.session.is_placeholder(i);
                    ui.add_space(4.0);
                    render_message(ui, msg, dark, pending);
                }
            });
    });
}

fn render_message(ui: &mut egui::Ui, msg: &Message, dark: bool, pending: bool) {
    let text_color = if dark {
        egui::Color32::from_gray(225)
    } else {
        egui::Color32::from_gray(30)
    };
    let max_width = ui.available_width() * 0.8;

    match msg.kind {
        MessageKind::User => {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, egui::Color32::from_rgb(60, 110, 170), max_width, |ui| {
                    ui.label(egui::RichText::new(&msg.content).color(egui::Color32::WHITE));
                    ui.label(
                        egui::RichText::new(msg.time_label())
                            .small()
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
        }
        MessageKind::Assistant => {
            let fill = if dark {
                egui::Color32::from_rgb(50, 50, 58)
            } else {
                egui::Color32::from_rgb(230, 230, 235)
            };
            bubble(ui, fill, max_width, |ui| {
                if pending {
                    let time = ui.input(|i| i.time);
                    let dots = match ((time * 2.0) as i32) % 4 {
                        0 => "   ",
                        1 => ".  ",
                        2 => ".. ",
                        _ => "...",
                    };
                    ui.label(egui::RichText::new(format!("Thinking{}", dots)).italics());
                } else {
                    simple_md::render_markdown(ui, &msg.content, text_color);
                    ui.label(egui::RichText::new(msg.time_label()).small().weak());
                }
            });
        }
        MessageKind::System => {
            ui.vertical_centered(|ui| {
                bubble(ui, egui::Color32::from_rgb(42, 77, 58), 300.0, |ui| {
                    ui.label(
                        egui::RichText::new(&msg.content)
                            .small()
                            .color(egui::Color32::from_rgb(144, 238, 144)),
                    );
                });
            });
        }
        MessageKind::Error => {
            bubble(ui, egui::Color32::from_rgb(90, 35, 40), max_width, |ui| {
                ui.label(
                    egui::RichText::new(&msg.content).color(egui::Color32::from_rgb(255, 170, 170)),
                );
                ui.label(egui::RichText::new(msg.time_label()).small().weak());
            });
        }
    }
}

fn bubble(
    ui: &mut egui::Ui,
    fill: egui::Color32,
    max_width: f32,
    add_contents: impl FnOnce(&mut egui::Ui),
) {
    egui::Frame::none()
        .fill(fill)
        .rounding(egui::Rounding::same(12.0))
        .inner_margin(egui::Margin::same(10.0))
        .show(ui, |ui| {
            ui.set_max_width(max_width);
            add_contents(ui);
        });
}

fn render_loading_overlay(ctx: &egui::Context, s: &AppState) {
    let Some(status) = &s.loading_status else {
        return;
    };
    egui::Window::new("loading")
        .title_bar(false)
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(status);
            });
        });
}
