use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use lettora::effects::{Effects, ParticleKind};
use lettora::Phase;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // particles sit behind the text
        render_particles(&self.effects, area, buf);

        match self.game.phase() {
            Phase::Idle => render_intro(self, area, buf),
            Phase::Running => render_game(self, area, buf),
            Phase::Ended => render_end(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn letter_spans(app: &App) -> Line<'static> {
    let letters = app.game.session().letters;
    let tile = Style::default()
        .patch(bold())
        .fg(Color::Black)
        .bg(Color::Green);
    let tiles = [letters.first(), letters.second()]
        .into_iter()
        .map(|c| Span::styled(format!(" {c} "), tile));
    let spans = Itertools::intersperse(tiles, Span::raw("  ")).collect::<Vec<_>>();
    Line::from(spans)
}

fn render_intro(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // title
            Constraint::Length(1),
            Constraint::Length(1), // letters
            Constraint::Length(1),
            Constraint::Length(2), // rules
            Constraint::Length(1), // high score
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "L E T T O R A",
        Style::default().patch(bold()).fg(Color::Green),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(letter_spans(app))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(format!(
        "Find words that contain both letters. You have {} seconds.",
        app.game.config().session_secs
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[5], buf);

    Paragraph::new(Span::styled(
        format!("High score: {}", app.game.high_score()),
        Style::default().fg(Color::Yellow),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);

    Paragraph::new(Span::styled("(enter) start / (esc)ape", italic()))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);
}

fn render_game(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.game.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // letters
            Constraint::Length(1),
            Constraint::Length(1), // timer + score
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Length(1), // message
            Constraint::Length(1),
            Constraint::Min(1),    // words
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(letter_spans(app))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let timer_style = if session.warning {
        Style::default()
            .patch(bold())
            .fg(Color::Red)
            .add_modifier(Modifier::SLOW_BLINK)
    } else {
        bold()
    };
    Paragraph::new(Line::from(vec![
        Span::styled(format!("Time left: {}", session.time_remaining), timer_style),
        Span::raw("   "),
        Span::styled(format!("Score: {}", session.score), bold()),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let total = app.game.config().session_secs.max(1);
    let ratio = f64::from(session.time_remaining.min(total)) / f64::from(total);
    Gauge::default()
        .gauge_style(Style::default().fg(if session.warning {
            Color::Red
        } else {
            Color::Green
        }))
        .ratio(ratio)
        .label("")
        .render(chunks[3], buf);

    let mut input_spans = vec![
        Span::styled("> ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(app.input.clone(), bold()),
        Span::styled(
            "_",
            Style::default().add_modifier(Modifier::SLOW_BLINK | Modifier::DIM),
        ),
    ];
    if app.pending_lookups > 0 {
        input_spans.push(Span::styled(
            format!("  checking{}", ".".repeat(app.pending_lookups.min(3))),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Paragraph::new(Line::from(input_spans))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

    if let Some(message) = app.visible_message() {
        Paragraph::new(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    render_words(app, chunks[8], buf);

    Paragraph::new(Span::styled(
        "(enter) submit / (tab) finish / (esc)ape",
        italic(),
    ))
    .render(chunks[9], buf);
}

/// Accepted words with their points, flowing left to right, newest last.
fn render_words(app: &App, area: Rect, buf: &mut Buffer) {
    let max_width = area.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    let mut used = 0;

    for accepted in &app.game.session().words {
        let word = accepted.word.clone();
        let points = format!(" +{}", accepted.points);
        let width = word.width() + points.width() + 3;
        if used + width > max_width && !current.is_empty() {
            lines.push(Line::from(std::mem::take(&mut current)));
            used = 0;
        }
        current.push(Span::styled(word, bold()));
        current.push(Span::styled(points, Style::default().fg(Color::Green)));
        current.push(Span::raw("   "));
        used += width;
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    let visible = area.height as usize;
    let skip = lines.len().saturating_sub(visible);
    Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_end(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.game.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1), // final score
            Constraint::Length(1), // words summary
            Constraint::Length(1), // high score
            Constraint::Length(1),
            Constraint::Length(3), // words
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let mut headline = vec![Span::styled(
        format!("Final score: {}", session.score),
        Style::default().patch(bold()).fg(Color::Green),
    )];
    if session.new_high_score {
        headline.push(Span::styled(
            " (New High Score!)",
            Style::default().patch(bold()).fg(Color::Yellow),
        ));
    }
    Paragraph::new(Line::from(headline))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} word{} with {}",
            session.words.len(),
            if session.words.len() == 1 { "" } else { "s" },
            session.letters
        ),
        italic(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(format!("High score: {}", app.game.high_score()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    Paragraph::new(session.words.iter().map(|w| w.word.as_str()).join(", "))
        .style(Style::default().add_modifier(Modifier::DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    let legend = if Browser::is_available() {
        "(r)etry / (t)weet / (esc)ape"
    } else {
        "(r)etry / (esc)ape"
    };
    Paragraph::new(Span::styled(legend, italic())).render(chunks[7], buf);
}

fn render_particles(effects: &Effects, area: Rect, buf: &mut Buffer) {
    let ambient = [Color::Green, Color::LightGreen, Color::Rgb(46, 125, 50)];
    let confetti = [
        Color::Green,
        Color::LightGreen,
        Color::Rgb(46, 125, 50),
        Color::Rgb(165, 214, 167),
    ];

    for particle in &effects.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let (x, y) = (particle.x as u16, particle.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let fading = particle.age / particle.max_age > 0.6;
        let style = match particle.kind {
            ParticleKind::Ambient => {
                Style::default().fg(ambient[particle.color_index % ambient.len()])
            }
            ParticleKind::Confetti => Style::default()
                .fg(confetti[particle.color_index % confetti.len()])
                .add_modifier(Modifier::BOLD),
        };
        let style = if fading {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        };

        buf.set_string(
            area.x + x,
            area.y + y,
            particle.symbol.to_string(),
            style,
        );
    }
}
