//! TUI rendering for the fortune calculator using ratatui.
//!
//! One screen per session phase: the form while idle, a spinner while a
//! calculation is pending, and the report (or a configuration diagnostic)
//! once settled.

mod app;
mod field;
mod input;
mod theme;

pub use app::{Field, FortuneApp};
pub use field::TextField;
pub use input::{InputPump, apply_key, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use fortune_core::errors::render_failure_notice;
use fortune_engine::{ATTRIBUTION, Phase, RenderError, ReportHeader, ResultView};
use fortune_types::Category;

const LABEL_WIDTH: usize = 9;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &FortuneApp) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);

    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(1),    // Body
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    draw_title(frame, app, chunks[0], &palette);

    let calculator = app.calculator();
    match calculator.phase() {
        Phase::Idle => draw_form(frame, app, chunks[1], &palette, &glyphs),
        Phase::Pending => draw_pending(frame, app, chunks[1], &palette),
        Phase::Settled => match calculator.view() {
            Some(Ok(view)) => draw_report(
                frame,
                &view,
                calculator.header().as_ref(),
                chunks[1],
                &palette,
                &glyphs,
            ),
            Some(Err(err)) => draw_render_failure(frame, &err, chunks[1], &palette),
            None => draw_form(frame, app, chunks[1], &palette, &glyphs),
        },
    }

    draw_key_hints(frame, app, chunks[2], &palette);
}

fn draw_title(frame: &mut Frame, app: &FortuneApp, area: Rect, palette: &Palette) {
    let line = Line::from(vec![
        Span::styled("Fortune Calculator", styles::title(palette)),
        Span::styled(
            format!("  engine: {}", app.calculator().engine_name()),
            Style::default().fg(palette.text_muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn panel<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(Span::styled(title, styles::title(palette)))
        .style(Style::default().bg(palette.bg_panel))
}

fn field_prefix(field: Field, focused: bool, glyphs: &Glyphs) -> String {
    let marker = if focused { glyphs.focus } else { " " };
    format!("{marker} {:<LABEL_WIDTH$} : ", field.label())
}

fn draw_form(frame: &mut Frame, app: &FortuneApp, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let block = panel(" Your details ", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let calculator = app.calculator();
    let mut lines = Vec::new();
    for field in [Field::Name, Field::Birthdate] {
        let focused = app.focus() == field;
        let mut spans = vec![
            Span::styled(
                field_prefix(field, focused, glyphs),
                styles::field_label(palette, focused),
            ),
            Span::styled(
                app.field(field).text().to_string(),
                Style::default().fg(palette.text_primary),
            ),
        ];
        if field == Field::Birthdate {
            spans.push(Span::styled(
                "  (YYYY-MM-DD)",
                Style::default().fg(palette.text_muted),
            ));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());

    if let Some(flag) = calculator.input().flag() {
        lines.push(Line::from(Span::styled(
            format!("{} {flag}", glyphs.warning),
            Style::default().fg(palette.warning),
        )));
    }
    if let Some(notice) = app.notice() {
        lines.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(palette.warning),
        )));
    }
    if let Some(failure) = calculator.failure_notice() {
        lines.push(Line::default());
        for text in failure.lines() {
            lines.push(Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(palette.error),
            )));
        }
    }

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        inner,
    );

    let focused = app.focus();
    let row: u16 = match focused {
        Field::Name => 0,
        Field::Birthdate => 1,
    };
    let column = field_prefix(focused, true, glyphs).width() + app.field(focused).cursor_column();
    let x = inner
        .x
        .saturating_add(u16::try_from(column).unwrap_or(u16::MAX))
        .min(inner.right().saturating_sub(1));
    if inner.height > row {
        frame.set_cursor_position((x, inner.y + row));
    }
}

fn draw_pending(frame: &mut Frame, app: &FortuneApp, area: Rect, palette: &Palette) {
    let block = panel(" Calculating ", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let spinner = spinner_frame(app.tick_count(), app.ui_options());
    let mut lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled(spinner, Style::default().fg(palette.accent)),
            Span::styled(
                " Calculating your fortune...",
                Style::default().fg(palette.text_primary),
            ),
        ]),
    ];
    if let Some(header) = app.calculator().header() {
        lines.push(Line::from(Span::styled(
            header.to_string(),
            Style::default().fg(palette.text_muted),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        inner,
    );
}

fn recommendation_lines<'a>(
    view: &'a ResultView,
    category: Category,
    marker: &'a str,
    color: Color,
    palette: &Palette,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for item in view.group(category) {
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(
                item.title.as_str(),
                Style::default()
                    .fg(palette.text_primary)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", item.description),
            Style::default().fg(palette.text_secondary),
        )));
    }
    lines
}

fn draw_report(
    frame: &mut Frame,
    view: &ResultView,
    header: Option<&ReportHeader>,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let block = panel(" Fortune Report ", palette);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Badge
            Constraint::Length(1), // Score gauge
            Constraint::Min(4),    // Do / avoid
            Constraint::Length(5), // Interpretation
            Constraint::Length(1), // Attribution
        ])
        .split(inner);

    if let Some(header) = header {
        frame.render_widget(
            Paragraph::new(Span::styled(
                header.to_string(),
                Style::default().fg(palette.text_muted),
            )),
            rows[0],
        );
    }

    let tone = palette.tone(view.badge.tone);
    let badge = Line::from(vec![
        Span::styled(
            format!(" {} ", view.badge.label),
            Style::default()
                .fg(palette.bg_dark)
                .bg(tone)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(view.badge.description.as_str(), Style::default().fg(tone)),
    ]);
    frame.render_widget(Paragraph::new(badge), rows[1]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(tone).bg(palette.bg_dark))
        .ratio(view.score.ratio())
        .label(view.score.to_string());
    frame.render_widget(gauge, rows[2]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);
    let encouraged = recommendation_lines(
        view,
        Category::Do,
        glyphs.check,
        palette.success,
        palette,
    );
    let discouraged = recommendation_lines(
        view,
        Category::Avoid,
        glyphs.cross,
        palette.error,
        palette,
    );
    frame.render_widget(
        Paragraph::new(encouraged)
            .block(panel(" Do ", palette))
            .wrap(Wrap { trim: true }),
        columns[0],
    );
    frame.render_widget(
        Paragraph::new(discouraged)
            .block(panel(" Avoid ", palette))
            .wrap(Wrap { trim: true }),
        columns[1],
    );

    frame.render_widget(
        Paragraph::new(view.interpretation.as_str())
            .style(Style::default().fg(palette.text_primary))
            .block(panel(" Interpretation ", palette))
            .wrap(Wrap { trim: true }),
        rows[4],
    );

    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{} {}", glyphs.separator, ATTRIBUTION.as_str()),
            Style::default().fg(palette.text_muted),
        ))
        .alignment(Alignment::Center),
        rows[5],
    );
}

fn draw_render_failure(frame: &mut Frame, err: &RenderError, area: Rect, palette: &Palette) {
    let notice = render_failure_notice(err);
    let block = panel(" Configuration error ", palette)
        .border_style(Style::default().fg(palette.error));
    frame.render_widget(
        Paragraph::new(Text::from(notice.as_str().to_string()))
            .style(Style::default().fg(palette.error))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_key_hints(frame: &mut Frame, app: &FortuneApp, area: Rect, palette: &Palette) {
    let key = |text: &'static str| Span::styled(text, styles::key_highlight(palette));
    let hint = |text: &'static str| Span::styled(text, styles::key_hint(palette));

    let spans = match app.calculator().phase() {
        Phase::Idle => {
            let submit_style = if app.calculator().can_submit() {
                styles::key_highlight(palette)
            } else {
                styles::key_disabled(palette)
            };
            vec![
                Span::styled("Enter", submit_style),
                hint(" calculate  "),
                key("Tab"),
                hint(" switch field  "),
                key("Ctrl-C"),
                hint(" quit"),
            ]
        }
        Phase::Pending => vec![key("Ctrl-C"), hint(" quit")],
        Phase::Settled => vec![
            key("r/Esc"),
            hint(" new reading  "),
            key("Ctrl-C"),
            hint(" quit"),
        ],
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
