use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::timer::Timer;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Timer list
            Constraint::Length(3), // Input/Status
        ])
        .margin(1)
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![Span::styled(
        "Timer TUI",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title_alignment(ratatui::layout::Alignment::Center),
    );
    f.render_widget(title, chunks[0]);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::styled(
                "Timers",
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" ({})", app.timers.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .border_style(Style::default().fg(Color::LightBlue));

    if app.timers.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            "No timers yet. Press a for a custom timer, p for a Pomodoro, e for eye care.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(list_block)
        .wrap(Wrap { trim: true });
        f.render_widget(hint, chunks[1]);
    } else {
        let items: Vec<ListItem> = app.timers.iter().map(timer_row).collect();
        let list = List::new(items)
            .block(list_block)
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .fg(Color::LightBlue),
            )
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, chunks[1], &mut app.list_state);
    }

    let status = Paragraph::new(status_line(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title("Status"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(status, chunks[2]);
}

fn timer_row(timer: &Timer) -> ListItem<'_> {
    let mut spans: Vec<Span> = vec![
        if timer.is_running {
            Span::styled("● ", Style::default().fg(Color::LightGreen))
        } else {
            Span::styled("○ ", Style::default().fg(Color::LightBlue))
        },
        Span::styled(
            format!("{:>8} ", timer.display()),
            if timer.is_running {
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            },
        ),
        Span::styled(timer.def.name.clone(), Style::default().fg(Color::White)),
    ];

    if timer.is_alternate {
        spans.push(Span::styled(" [break]", Style::default().fg(Color::Yellow)));
    }
    if timer.auto_repeat {
        spans.push(Span::styled(
            " [repeat]",
            Style::default().fg(Color::DarkGray),
        ));
    }
    if !timer.sound_on {
        spans.push(Span::styled(
            " [mute]",
            Style::default().fg(Color::DarkGray),
        ));
    }

    ListItem::new(Line::from(spans))
}

// An open prompt owns the status line; messages show in Normal mode only.
fn status_line(app: &App) -> Line<'_> {
    match &app.status {
        Some(message) if app.input_mode == InputMode::Normal => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        _ => status_for_mode(app),
    }
}

fn status_for_mode(app: &App) -> Line<'_> {
    match app.input_mode {
        InputMode::Normal => {
            let mode_style = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            let key_style = Style::default().fg(Color::Yellow);
            let text_style = Style::default().fg(Color::White);

            Line::from(vec![
                Span::styled("NORMAL", mode_style),
                Span::raw(" | "),
                Span::styled("↑/↓", key_style),
                Span::styled(": select", text_style),
                Span::raw(" | "),
                Span::styled("Space", key_style),
                Span::styled(": start/stop", text_style),
                Span::raw(" | "),
                Span::styled("a", key_style),
                Span::styled(": add", text_style),
                Span::raw(" | "),
                Span::styled("p", key_style),
                Span::styled(": pomodoro", text_style),
                Span::raw(" | "),
                Span::styled("e", key_style),
                Span::styled(": eye care", text_style),
                Span::raw(" | "),
                Span::styled("c", key_style),
                Span::styled(": change time", text_style),
                Span::raw(" | "),
                Span::styled("n", key_style),
                Span::styled(": rename", text_style),
                Span::raw(" | "),
                Span::styled("r", key_style),
                Span::styled(": reset", text_style),
                Span::raw(" | "),
                Span::styled("s", key_style),
                Span::styled(": sound", text_style),
                Span::raw(" | "),
                Span::styled("t", key_style),
                Span::styled(": repeat", text_style),
                Span::raw(" | "),
                Span::styled("d", key_style),
                Span::styled(": delete", text_style),
                Span::raw(" | "),
                Span::styled("q", key_style),
                Span::styled(": quit", text_style),
            ])
        }
        InputMode::AddingName => prompt_line(
            "ADD",
            Color::LightGreen,
            "Enter: next | Esc: cancel",
            "Name: ",
            &app.input,
        ),
        InputMode::AddingPrimary => prompt_line(
            "ADD",
            Color::LightGreen,
            "Enter: next | Esc: cancel",
            "Duration (seconds): ",
            &app.input,
        ),
        InputMode::AskingAlternate => prompt_line(
            "ADD",
            Color::LightGreen,
            "y: yes | n: no | Esc: cancel",
            "Add a break duration?",
            "",
        ),
        InputMode::AddingAlternate => prompt_line(
            "ADD",
            Color::LightGreen,
            "Enter: save | Esc: cancel",
            "Break (seconds): ",
            &app.input,
        ),
        InputMode::EditingPrimary => prompt_line(
            "EDIT",
            Color::LightYellow,
            "Enter: next | Esc: cancel",
            "Duration (seconds): ",
            &app.input,
        ),
        InputMode::EditingAlternate => prompt_line(
            "EDIT",
            Color::LightYellow,
            "Enter: save | Esc: keep old break",
            "Break (seconds): ",
            &app.input,
        ),
        InputMode::EditingName => prompt_line(
            "EDIT",
            Color::LightYellow,
            "Enter: save | Esc: cancel",
            "Name: ",
            &app.input,
        ),
    }
}

fn prompt_line<'a>(
    badge: &'a str,
    color: Color,
    hint: &'a str,
    label: &'a str,
    value: &'a str,
) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            badge,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
        Span::raw(" | "),
        Span::styled(label, Style::default().fg(Color::White)),
        Span::styled(value, Style::default().fg(color)),
    ])
}
