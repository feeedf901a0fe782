use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use color_eyre::eyre::{Result, eyre};
use eframe::egui;
use strum::IntoEnumIterator;
use tracing::{error, info};

use tris::game::{self, Delivery, Difficulty, Engine, GameOutcome, ReplyTicket, Table};

type Reply = (ReplyTicket, Result<usize, game::Error>);

struct App {
    table: Table,

    req_tx: Sender<ReplyTicket>,
    resp_rx: Receiver<Reply>,
}

impl App {
    fn new(difficulty: Difficulty) -> Self {
        let (req_tx, req_rx) = channel::<ReplyTicket>();
        let (resp_tx, resp_rx) = channel::<Reply>();

        std::thread::spawn(move || {
            let mut engine = Engine::new();
            let mut next = req_rx.recv().ok();
            while let Some(ticket) = next.take() {
                let reply = ticket.compute(&mut engine);

                // A newer ticket supersedes this one; stop waiting on it.
                match req_rx.recv_timeout(ticket.due().saturating_duration_since(Instant::now())) {
                    Ok(newer) => {
                        next = Some(newer);
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                if resp_tx.send((ticket, reply)).is_err() {
                    break;
                }
                next = req_rx.recv().ok();
            }
        });

        Self {
            table: Table::new(game::GameSession::new(difficulty)),
            req_tx,
            resp_rx,
        }
    }
}

#[derive(Clone, Copy)]
struct GridHelper {
    rect: egui::Rect,
}

impl GridHelper {
    fn new(screen: egui::Rect) -> Self {
        let square_size = screen.width().min(screen.height()) * 0.9;
        let rect =
            egui::Rect::from_center_size(screen.center(), egui::vec2(square_size, square_size));
        Self { rect }
    }

    fn position(&self, index: usize) -> egui::Pos2 {
        let (row, col) = (index / 3, index % 3);
        let x = self.rect.left() + self.rect.width() / 3.0 * col as f32 + self.rect.width() / 6.0;
        let y = self.rect.top() + self.rect.height() / 3.0 * row as f32 + self.rect.height() / 6.0;
        egui::pos2(x, y)
    }

    fn square_size(&self) -> f32 {
        self.rect.width() / 3.0
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_thread_ids(true))
        .with(
            tracing_subscriber::filter::Targets::new()
                .with_target("tris", tracing::Level::TRACE)
                .with_default(tracing::Level::INFO),
        )
        .try_init()?;

    let difficulty = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<Difficulty>())
        .transpose()?
        .unwrap_or_default();
    info!(%difficulty, "starting");

    eframe::run_native(
        "Tris",
        eframe::NativeOptions::default(),
        Box::new(move |_cc| Ok(Box::new(App::new(difficulty)))),
    )
    .map_err(|e| eyre!("{e:?}"))?;
    Ok(())
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("side_panel").show(ctx, |ui| {
            ui.heading("Tris");
            ui.label("You are X. The computer plays O.");
            ui.separator();

            let current = self.table.session().difficulty();
            let mut difficulty = current;
            egui::ComboBox::from_label("Difficulty")
                .selected_text(difficulty.to_string())
                .show_ui(ui, |ui| {
                    for option in Difficulty::iter() {
                        ui.selectable_value(&mut difficulty, option, option.to_string());
                    }
                });
            if difficulty != current {
                info!(%difficulty, "difficulty_changed");
                self.table.set_difficulty(difficulty);
            }

            if ui.button("Reset").clicked() {
                self.table.reset();
            }

            ui.separator();
            match self.table.session().outcome() {
                GameOutcome::Ongoing if self.table.is_thinking() => {
                    ui.horizontal(|ui| {
                        ui.label("Thinking...");
                        ui.spinner();
                    });
                }
                GameOutcome::Ongoing => {
                    ui.label("Your move.");
                }
                GameOutcome::Draw => {
                    ui.heading("It's a draw!");
                }
                GameOutcome::Win(mark) => {
                    ui.heading(format!("Winner: {mark}"));
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            draw_game(ui, self);
        });

        if self.table.is_thinking() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

fn draw_game(ui: &mut egui::Ui, app: &mut App) {
    while let Ok((ticket, reply)) = app.resp_rx.try_recv() {
        let _span = tracing::debug_span!("computer_reply", "reply" = ?reply).entered();
        if let Delivery::Retry(retry) = app.table.deliver(ticket, reply)
            && app.req_tx.send(retry).is_err()
        {
            error!("worker_gone");
        }
    }

    let gh = GridHelper::new(ui.max_rect());
    draw_grid_lines(ui, gh);

    let board = *app.table.session().board();
    let mut player_move = None;
    for index in 0..game::CELLS {
        if draw_grid_item(ui, gh, index, board.cell(index)).clicked() {
            player_move = Some(index);
        }
    }

    if let Some([first, _, last]) = game::winning_line(&board) {
        ui.painter().line_segment(
            [gh.position(first), gh.position(last)],
            egui::Stroke::new(4.0, egui::Color32::GREEN),
        );
    }

    if let Some(index) = player_move
        && let Some(ticket) = app.table.human_move(index, Instant::now())
        && app.req_tx.send(ticket).is_err()
    {
        error!("worker_gone");
    }
}

fn draw_grid_item(
    ui: &mut egui::Ui,
    gh: GridHelper,
    index: usize,
    mark: Option<game::Mark>,
) -> egui::Response {
    let painter = ui.painter();

    let egui::Pos2 { x, y } = gh.position(index);
    let radius = gh.square_size() / 2.0 * 0.7;

    if let Some(mark) = mark {
        draw_mark(painter, x, y, radius, mark);
    }

    ui.interact(
        egui::Rect::from_center_size(egui::pos2(x, y), egui::vec2(radius * 2.0, radius * 2.0)),
        ui.id().with(index),
        egui::Sense::click(),
    )
}

fn draw_mark(painter: &egui::Painter, x: f32, y: f32, radius: f32, mark: game::Mark) {
    match mark {
        game::Mark::X => {
            let stroke = egui::Stroke::new(3.0, egui::Color32::RED);
            painter.line_segment(
                [
                    egui::pos2(x - radius, y - radius),
                    egui::pos2(x + radius, y + radius),
                ],
                stroke,
            );
            painter.line_segment(
                [
                    egui::pos2(x + radius, y - radius),
                    egui::pos2(x - radius, y + radius),
                ],
                stroke,
            );
        }
        game::Mark::O => {
            painter.circle(
                egui::Pos2 { x, y },
                radius,
                egui::Color32::TRANSPARENT,
                egui::Stroke::new(3.0, egui::Color32::BLUE),
            );
        }
    }
}

fn draw_grid_lines(ui: &mut egui::Ui, gh: GridHelper) {
    let painter = ui.painter();
    let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_GRAY);
    let cell = gh.square_size();

    for i in 1..3 {
        let x = gh.rect.left() + i as f32 * cell;
        painter.line_segment(
            [egui::pos2(x, gh.rect.top()), egui::pos2(x, gh.rect.bottom())],
            stroke,
        );

        let y = gh.rect.top() + i as f32 * cell;
        painter.line_segment(
            [egui::pos2(gh.rect.left(), y), egui::pos2(gh.rect.right(), y)],
            stroke,
        );
    }
}
