use chrono::{DateTime, Local};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table};
use stageboard_core::{BoardViewModel, CheckMark, RepoRow};

use super::constants::{DETAIL_HEADERS, DETAIL_TITLE, KEY_HINTS, WINDOW_TITLE};

pub(crate) fn draw(frame: &mut ratatui::Frame, view: &BoardViewModel, now: DateTime<Local>) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(header_line(now));
    let inner = outer.inner(frame.area());
    frame.render_widget(outer, frame.area());

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(view.banner.clone()), parts[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(parts[1]);
    render_checklist(frame, view, columns[0]);
    render_details(frame, view, columns[1]);

    frame.render_widget(
        Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
        parts[2],
    );
}

fn header_line(now: DateTime<Local>) -> Line<'static> {
    Line::from(vec![
        Span::styled(WINDOW_TITLE, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("updated {}", now.format("%H:%M:%S")),
            Style::default().fg(Color::Gray),
        ),
    ])
}

fn render_checklist(frame: &mut ratatui::Frame, view: &BoardViewModel, area: Rect) {
    let rows: Vec<ListItem<'static>> = if view.stages.is_empty() {
        vec![ListItem::new("(no stages yet)")]
    } else {
        view.stages
            .iter()
            .map(|stage| ListItem::new(format_stage_row(stage.mark, &stage.text)))
            .collect()
    };

    let mut state = ListState::default();
    if !view.stages.is_empty() {
        state.select(view.selected.map(|idx| idx.min(view.stages.len() - 1)));
    }

    let list = List::new(rows)
        .block(Block::default().borders(Borders::RIGHT))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_details(frame: &mut ratatui::Frame, view: &BoardViewModel, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    frame.render_widget(
        Paragraph::new(DETAIL_TITLE).style(Style::default().add_modifier(Modifier::BOLD)),
        parts[0],
    );

    let header = Row::new(DETAIL_HEADERS.iter().map(|title| Cell::from(*title)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = view.repo_rows.iter().map(repo_table_row);
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(28),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Percentage(40),
        ],
    )
    .header(header);
    frame.render_widget(table, parts[1]);
}

fn repo_table_row(row: &RepoRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(row.display_label().to_string()),
        Cell::from(row.status.clone()),
        Cell::from(row.updated_at.clone()),
        Cell::from(joined_messages(&row.messages)),
    ])
}

fn format_stage_row(mark: CheckMark, text: &str) -> String {
    format!("{} {}", mark_glyph(mark), text)
}

fn mark_glyph(mark: CheckMark) -> &'static str {
    match mark {
        CheckMark::Done => "[x]",
        CheckMark::InProgress => "[~]",
        CheckMark::NotStarted => "[ ]",
        CheckMark::Indeterminate => "[?]",
    }
}

/// Pipe-joined message column, blanks dropped.
fn joined_messages(messages: &[String]) -> String {
    messages
        .iter()
        .map(|message| message.trim())
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use stageboard_core::CheckMark;

    use super::{format_stage_row, joined_messages};

    #[test]
    fn stage_rows_carry_mark_glyphs() {
        assert_eq!(
            format_stage_row(CheckMark::Done, "Fetch - completed"),
            "[x] Fetch - completed"
        );
        assert_eq!(
            format_stage_row(CheckMark::InProgress, "Sync - running"),
            "[~] Sync - running"
        );
        assert_eq!(
            format_stage_row(CheckMark::NotStarted, "Push - pending"),
            "[ ] Push - pending"
        );
        assert_eq!(
            format_stage_row(CheckMark::Indeterminate, "Scan - paused"),
            "[?] Scan - paused"
        );
    }

    #[test]
    fn messages_join_with_pipes_and_drop_blanks() {
        let messages = vec![
            "cloned".to_string(),
            "   ".to_string(),
            "pushed".to_string(),
        ];
        assert_eq!(joined_messages(&messages), "cloned | pushed");
        assert_eq!(joined_messages(&[]), "");
    }
}
