//! Lexbridge Studio - citation-linked legal research with IPC/BNS graphs
//! Built with egui for native Wayland support

use eframe::egui::{self, Color32, RichText, Stroke};
use lexbridge_studio::citation::{resolve_with, Citation, ResolvedDraft, Segment};
use lexbridge_studio::config::AppConfig;
use lexbridge_studio::diagram::{GraphPalette, GraphRenderer, GraphView};
use lexbridge_studio::error::LexError;
use lexbridge_studio::service::{
    AuditReport, ClientConfig, HealthResponse, QueryResponse, ServiceClient, Severity,
};
use lexbridge_studio::theme::Theme;
use lexbridge_studio::viewport::{
    RegimeMode, RequestSequencer, RequestToken, StoreEvent, ViewportStore,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════
// UI SPACING CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════

const SECTION_SPACING: f32 = 12.0;
const ELEMENT_SPACING: f32 = 8.0;
const CARD_MARGIN: f32 = 8.0;
const CARD_ROUNDING: f32 = 6.0;

fn main() -> eframe::Result<()> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::fallback(), Some(e)),
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_filter()),
    )
    .init();
    if let Some(e) = &config_error {
        log::warn!("Config ignored, using defaults: {}", e);
    }
    log::info!("Using research service at {}", config.service_url);

    let client = match ServiceClient::new(ClientConfig::from(&config)) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Lexbridge Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Lexbridge Studio",
        options,
        Box::new(|cc| {
            Ok(Box::new(LexbridgeStudio::new(
                &cc.egui_ctx,
                config,
                client,
                config_error,
            )))
        }),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ask,
    Draft,
    Audit,
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::Ask => "🔍 Ask",
            Mode::Draft => "📝 Draft",
            Mode::Audit => "🛡 Audit",
        }
    }
}

/// Results coming back from worker threads
enum ServiceEvent {
    Answer {
        token: RequestToken,
        mode: Mode,
        result: Result<QueryResponse, LexError>,
    },
    Audit {
        token: RequestToken,
        result: Result<AuditReport, LexError>,
    },
    Health(Result<HealthResponse, LexError>),
}

/// The answer or memo currently on screen
struct AnswerView {
    mode: Mode,
    resolved: ResolvedDraft,
    citations: Vec<Citation>,
    metadata: serde_json::Value,
}

struct LexbridgeStudio {
    config: AppConfig,
    theme: Theme,
    client: Arc<ServiceClient>,

    store: ViewportStore,
    store_events: Receiver<StoreEvent>,
    graph: GraphView,

    mode: Mode,
    query_input: String,
    facts_input: String,
    answer: Option<AnswerView>,
    audit: Option<AuditReport>,
    audit_sequencer: RequestSequencer,

    service_tx: Sender<ServiceEvent>,
    service_rx: Receiver<ServiceEvent>,
    answer_pending: bool,
    audit_pending: bool,
    health: Option<Result<HealthResponse, String>>,

    status_message: String,
    error_message: Option<String>,
}

impl LexbridgeStudio {
    fn new(
        ctx: &egui::Context,
        config: AppConfig,
        client: Arc<ServiceClient>,
        config_error: Option<LexError>,
    ) -> Self {
        let theme = Theme::by_name(&config.theme);
        let renderer = GraphRenderer::new(GraphPalette::from_theme(&theme), config.render_settings());

        let mut store = ViewportStore::new();
        let store_events = store.subscribe();
        let (service_tx, service_rx) = mpsc::channel();

        let mut app = Self {
            graph: GraphView::new(renderer, config.focus_timings()),
            config,
            theme,
            client,
            store,
            store_events,
            mode: Mode::Ask,
            query_input: String::new(),
            facts_input: String::new(),
            answer: None,
            audit: None,
            audit_sequencer: RequestSequencer::default(),
            service_tx,
            service_rx,
            answer_pending: false,
            audit_pending: false,
            health: None,
            status_message: "Ready".to_string(),
            error_message: config_error
                .map(|e| format!("Config ignored, using defaults: {}", e)),
        };
        app.check_health(ctx);
        app
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::warn!("{}", msg);
        self.error_message = Some(msg);
    }

    // ── Background requests ───────────────────────────────────────────────

    fn check_health(&mut self, ctx: &egui::Context) {
        let client = Arc::clone(&self.client);
        let tx = self.service_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(ServiceEvent::Health(client.health()));
            ctx.request_repaint();
        });
    }

    fn submit_answer_request(&mut self, ctx: &egui::Context, mode: Mode) {
        let input = match mode {
            Mode::Ask => self.query_input.clone(),
            Mode::Draft => self.facts_input.clone(),
            Mode::Audit => return,
        };

        let token = self.store.issue_request();
        self.answer_pending = true;
        self.error_message = None;
        self.set_status(match mode {
            Mode::Draft => "⏳ Drafting memo...",
            _ => "⏳ Researching...",
        });

        let client = Arc::clone(&self.client);
        let tx = self.service_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = match mode {
                Mode::Draft => client.draft(&input),
                _ => client.ask(&input),
            };
            let _ = tx.send(ServiceEvent::Answer {
                token,
                mode,
                result,
            });
            ctx.request_repaint();
        });
    }

    fn submit_audit(&mut self, ctx: &egui::Context, path: PathBuf) {
        let token = self.audit_sequencer.issue();
        self.audit_pending = true;
        self.error_message = None;
        self.set_status(format!("⏳ Auditing {}...", path.display()));

        let client = Arc::clone(&self.client);
        let tx = self.service_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = client.audit_file(&path);
            let _ = tx.send(ServiceEvent::Audit { token, result });
            ctx.request_repaint();
        });
    }

    fn poll_service(&mut self) {
        while let Ok(event) = self.service_rx.try_recv() {
            match event {
                ServiceEvent::Answer {
                    token,
                    mode,
                    result,
                } => self.handle_answer(token, mode, result),
                ServiceEvent::Audit { token, result } => {
                    if self.audit_sequencer.check(token).is_err() {
                        continue;
                    }
                    self.audit_pending = false;
                    match result {
                        Ok(report) => {
                            self.set_status(format!(
                                "✓ Audit of {}: {} findings in {} citations",
                                report.filename,
                                report.findings.len(),
                                report.total_citations
                            ));
                            self.audit = Some(report);
                        }
                        Err(e) => self.set_error(format!("Audit failed: {}", e)),
                    }
                }
                ServiceEvent::Health(result) => {
                    self.health = Some(result.map_err(|e| e.to_string()));
                }
            }
        }
    }

    fn handle_answer(&mut self, token: RequestToken, mode: Mode, result: Result<QueryResponse, LexError>) {
        if self.store.check_fresh(token).is_err() {
            return;
        }
        self.answer_pending = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.set_error(format!("Request failed: {}", e));
                self.set_status("Request failed");
                return;
            }
        };

        let resolved = resolve_with(&response.answer, &response.citations, self.config.resolution_policy);
        self.set_status(format!(
            "✓ {} citations, {} linked",
            response.citations.len(),
            resolved.substitutions.len()
        ));

        // Drafts come without a graph; keep whatever is on screen
        if let Some(payload) = &response.graph_data {
            let built = lexbridge_studio::diagram::build(payload);
            if let Err(e) = self.store.apply_snapshot(token, built) {
                self.set_error(format!("Graph not updated: {}", e));
            }
        }

        self.store.clear_active_citation();
        self.answer = Some(AnswerView {
            mode,
            resolved,
            citations: response.citations,
            metadata: response.metadata,
        });
    }

    fn poll_store_events(&mut self) {
        while let Ok(event) = self.store_events.try_recv() {
            match event {
                StoreEvent::CitationActivated(uuid) => {
                    let snapshot = self.store.snapshot();
                    if !self.graph.focus_on(&uuid, &snapshot) {
                        self.set_status("Citation has no node in the current graph");
                    }
                }
                StoreEvent::SnapshotRejected(reason) => {
                    self.set_error(format!("Graph payload rejected: {}", reason));
                }
                StoreEvent::SnapshotReplaced { nodes, edges } => {
                    log::debug!("Graph now {} nodes / {} edges", nodes, edges);
                }
                StoreEvent::HoverChanged(_) | StoreEvent::RegimeChanged(_) => {}
            }
        }
    }

    // ── Panels ────────────────────────────────────────────────────────────

    fn show_top_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("⚖ Lexbridge").color(self.theme.fg_bright));
            ui.add_space(SECTION_SPACING);

            for mode in [Mode::Ask, Mode::Draft, Mode::Audit] {
                ui.selectable_value(&mut self.mode, mode, mode.label());
            }

            ui.separator();
            ui.label(RichText::new("Regime:").color(self.theme.fg_dim));
            let mut regime = self.store.regime_mode();
            for mode in RegimeMode::all() {
                ui.selectable_value(&mut regime, *mode, mode.name());
            }
            self.store.set_regime_mode(regime);

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (dot, text) = match &self.health {
                    None => (self.theme.fg_dim, "checking...".to_string()),
                    Some(Ok(h)) if h.is_healthy() => (
                        self.theme.success,
                        match h.graph_stats {
                            Some(s) => format!("online · KG {} nodes", s.nodes),
                            None => "online".to_string(),
                        },
                    ),
                    Some(Ok(h)) => (self.theme.warning, h.status.clone()),
                    Some(Err(_)) => (self.theme.error, "offline".to_string()),
                };
                if ui.small_button("⟳").on_hover_text("Check service health").clicked() {
                    self.health = None;
                    self.check_health(ctx);
                }
                ui.label(RichText::new(text).color(self.theme.fg_dim).small());
                ui.label(RichText::new("●").color(dot));
            });
        });
    }

    fn show_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let busy = self.answer_pending || self.audit_pending;
            if busy {
                ui.spinner();
            }
            ui.label(RichText::new(&self.status_message).color(Color32::WHITE).small());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let snapshot = self.store.snapshot();
                ui.label(
                    RichText::new(format!(
                        "{} · {} · {}",
                        self.store.regime_mode().name(),
                        self.config.resolution_policy.name(),
                        self.config.language
                    ))
                    .color(Color32::WHITE)
                    .small(),
                );
                if snapshot.dropped_edges > 0 {
                    ui.label(
                        RichText::new(format!("{} dangling edges dropped", snapshot.dropped_edges))
                            .color(Color32::WHITE)
                            .small(),
                    );
                }
            });
        });
    }

    fn show_input(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let submit_shortcut = ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Enter));

        match self.mode {
            Mode::Ask => {
                ui.label(RichText::new("Legal question").color(self.theme.fg_dim));
                ui.add(
                    egui::TextEdit::multiline(&mut self.query_input)
                        .hint_text("e.g. What is the punishment for murder under the BNS?")
                        .desired_rows(3)
                        .desired_width(f32::INFINITY),
                );
                let enabled = !self.answer_pending && !self.query_input.trim().is_empty();
                let clicked = ui.add_enabled(enabled, egui::Button::new("Ask  ⌘↵")).clicked();
                if enabled && (clicked || submit_shortcut) {
                    self.submit_answer_request(ctx, Mode::Ask);
                }
            }
            Mode::Draft => {
                ui.label(RichText::new("Facts of the case").color(self.theme.fg_dim));
                ui.add(
                    egui::TextEdit::multiline(&mut self.facts_input)
                        .hint_text("Describe the facts; a memo with linked citations is drafted")
                        .desired_rows(6)
                        .desired_width(f32::INFINITY),
                );
                let enabled = !self.answer_pending && !self.facts_input.trim().is_empty();
                let clicked = ui.add_enabled(enabled, egui::Button::new("Draft memo  ⌘↵")).clicked();
                if enabled && (clicked || submit_shortcut) {
                    self.submit_answer_request(ctx, Mode::Draft);
                }
            }
            Mode::Audit => {
                ui.label(
                    RichText::new("Check a document for outdated IPC references")
                        .color(self.theme.fg_dim),
                );
                let enabled = !self.audit_pending;
                if ui
                    .add_enabled(enabled, egui::Button::new("📂 Choose document..."))
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Documents", &["pdf", "txt", "md"])
                        .pick_file()
                    {
                        self.submit_audit(ctx, path);
                    }
                }
            }
        }

        if let Some(err) = self.error_message.clone() {
            ui.add_space(ELEMENT_SPACING);
            egui::Frame::none()
                .fill(self.theme.error.gamma_multiply(0.15))
                .stroke(Stroke::new(1.0, self.theme.error.gamma_multiply(0.4)))
                .rounding(CARD_ROUNDING)
                .inner_margin(CARD_MARGIN)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(err).color(self.theme.error));
                        if ui.small_button("✕").clicked() {
                            self.error_message = None;
                        }
                    });
                });
        }
    }

    fn show_answer(&mut self, ui: &mut egui::Ui) {
        let Some(answer) = &self.answer else {
            return;
        };

        let title = match answer.mode {
            Mode::Draft => "Memo",
            _ => "Answer",
        };
        ui.label(RichText::new(title).strong().color(self.theme.fg_bright));
        ui.add_space(ELEMENT_SPACING / 2.0);

        let mut activated: Option<String> = None;
        let active = self.store.active_citation().map(str::to_string);

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for segment in answer.resolved.segments() {
                match segment {
                    Segment::Text(text) => {
                        let mut lines = text.split('\n').peekable();
                        while let Some(line) = lines.next() {
                            if !line.is_empty() {
                                ui.label(RichText::new(line).color(self.theme.fg));
                            }
                            if lines.peek().is_some() {
                                ui.end_row();
                            }
                        }
                    }
                    Segment::Link { label, uuid } => {
                        let mut text = RichText::new(&label).color(self.theme.link).underline();
                        if active.as_deref() == Some(uuid.as_str()) {
                            text = text.background_color(self.theme.accent_dim);
                        }
                        let summary = answer
                            .citations
                            .iter()
                            .find(|c| c.uuid == uuid)
                            .map(|c| format!("{}\n{}", c.provenance(), c.summary))
                            .unwrap_or_default();
                        if ui.link(text).on_hover_text(summary).clicked() {
                            activated = Some(uuid);
                        }
                    }
                }
            }
        });

        if !answer.metadata.is_null() {
            ui.add_space(ELEMENT_SPACING);
            egui::CollapsingHeader::new("Metadata")
                .default_open(false)
                .show(ui, |ui| {
                    let pretty = serde_json::to_string_pretty(&answer.metadata).unwrap_or_default();
                    ui.label(RichText::new(pretty).monospace().small());
                });
        }

        if let Some(uuid) = activated {
            self.store.activate_citation(uuid);
        }
    }

    fn show_citations(&mut self, ui: &mut egui::Ui) {
        let Some(answer) = &self.answer else {
            return;
        };
        if answer.citations.is_empty() {
            return;
        }

        ui.label(
            RichText::new(format!("Citations ({})", answer.citations.len()))
                .strong()
                .color(self.theme.fg_bright),
        );

        let active = self.store.active_citation().map(str::to_string);
        let mut activated: Option<String> = None;

        for citation in &answer.citations {
            let is_active = active.as_deref() == Some(citation.uuid.as_str());
            let stroke = if is_active {
                Stroke::new(1.5, self.theme.accent)
            } else {
                Stroke::new(1.0, self.theme.border)
            };

            egui::Frame::none()
                .fill(self.theme.panel_bg)
                .stroke(stroke)
                .rounding(CARD_ROUNDING)
                .inner_margin(CARD_MARGIN)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        let name = citation.entity().unwrap_or("Unnamed provision");
                        ui.label(RichText::new(name).strong().color(self.theme.fg));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("◎ Graph").on_hover_text("Show in graph").clicked() {
                                activated = Some(citation.uuid.clone());
                            }
                            ui.label(
                                RichText::new(format!("{:.2}", citation.score))
                                    .color(self.theme.fg_dim)
                                    .small(),
                            );
                        });
                    });
                    ui.label(
                        RichText::new(format!("{} · {}", citation.provenance(), citation.law_type))
                            .color(self.theme.fg_dim)
                            .small(),
                    );
                    if !citation.summary.is_empty() {
                        ui.label(RichText::new(&citation.summary).color(self.theme.fg));
                    }
                    ui.push_id(&citation.uuid, |ui| {
                        egui::CollapsingHeader::new("Full text")
                            .default_open(false)
                            .show(ui, |ui| {
                                ui.label(RichText::new(&citation.text).small());
                            });
                    });
                });
            ui.add_space(ELEMENT_SPACING / 2.0);
        }

        if let Some(uuid) = activated {
            self.store.activate_citation(uuid);
        }
    }

    fn show_audit(&mut self, ui: &mut egui::Ui) {
        let Some(report) = &self.audit else {
            ui.label(RichText::new("No document audited yet").color(self.theme.fg_dim));
            return;
        };

        ui.label(
            RichText::new(format!(
                "{} · {} citations checked",
                report.filename, report.total_citations
            ))
            .strong()
            .color(self.theme.fg_bright),
        );
        if report.findings.is_empty() {
            ui.label(RichText::new("✓ No outdated references found").color(self.theme.success));
            return;
        }

        for finding in report.by_severity() {
            let color = match finding.severity {
                Severity::High => self.theme.error,
                Severity::Medium => self.theme.warning,
                Severity::Low | Severity::Unknown => self.theme.fg_dim,
            };
            egui::Frame::none()
                .fill(color.gamma_multiply(0.12))
                .stroke(Stroke::new(1.0, color.gamma_multiply(0.4)))
                .rounding(CARD_ROUNDING)
                .inner_margin(CARD_MARGIN)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(finding.severity.name()).color(color).strong());
                        ui.label(RichText::new(&finding.citation).strong().color(self.theme.fg));
                        ui.label(RichText::new(&finding.status).color(self.theme.fg_dim).small());
                    });
                    if !finding.suggestion.is_empty() {
                        ui.label(RichText::new(format!("→ {}", finding.suggestion)).color(self.theme.fg));
                    }
                    if !finding.reasoning.is_empty() {
                        ui.label(RichText::new(&finding.reasoning).color(self.theme.fg_dim).small());
                    }
                });
            ui.add_space(ELEMENT_SPACING / 2.0);
        }
    }
}

impl eframe::App for LexbridgeStudio {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_service();
        self.poll_store_events();

        ctx.set_visuals(self.theme.visuals());
        let theme = self.theme;

        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(theme.panel_bg)
                    .inner_margin(egui::Margin::symmetric(12.0, 6.0)),
            )
            .show(ctx, |ui| {
                self.show_top_bar(ui, ctx);
            });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::none()
                    .fill(theme.statusbar_bg)
                    .inner_margin(egui::Margin::symmetric(12.0, 4.0)),
            )
            .show(ctx, |ui| {
                self.show_status_bar(ui);
            });

        egui::SidePanel::left("research_panel")
            .resizable(true)
            .default_width(460.0)
            .min_width(320.0)
            .frame(
                egui::Frame::none()
                    .fill(theme.bg)
                    .inner_margin(egui::Margin::same(12.0)),
            )
            .show(ctx, |ui| {
                self.show_input(ui, ctx);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if self.mode == Mode::Audit {
                            self.show_audit(ui);
                        } else {
                            self.show_answer(ui);
                            ui.add_space(SECTION_SPACING);
                            self.show_citations(ui);
                        }
                    });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let response = self.graph.ui(ui, &mut self.store);
                if let Some(id) = response.clicked {
                    let snapshot = self.store.snapshot();
                    let citation = snapshot.get(&id).and_then(|n| n.citation_uuid.clone());
                    match citation {
                        Some(uuid) => self.store.activate_citation(uuid),
                        None => {
                            self.graph.focus_on(&id, &snapshot);
                        }
                    }
                } else if response.clicked_empty {
                    self.store.clear_active_citation();
                }
            });
    }
}
