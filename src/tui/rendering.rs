use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, Wrap,
    },
};

use super::app::App;
use super::models::{ContentChoice, LinkView, MetadataState, Step};

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    match app.step {
        Step::Query => render_query_input(f, chunks[1], app),
        Step::Magnet => render_magnet(f, chunks[1], app),
        Step::Link => render_link_view(f, chunks[1], app),
        _ => render_item_list(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if app.show_help {
        render_help_popup(f);
    }
}

fn header_title(app: &App) -> String {
    let mut title = String::from("Cine Finder");
    if let Some(result) = &app.selected_result {
        title.push_str(" - ");
        title.push_str(&result.title);
    } else if let Some(name) = &app.series_name {
        title.push_str(" - ");
        title.push_str(&crate::title::series_display_name(name));
    }
    title
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(header_title(app))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, area);
}

pub fn render_item_list(f: &mut Frame, area: Rect, app: &App) {
    let labels = app.items();
    let count = labels.len();
    let items: Vec<ListItem> = labels
        .into_iter()
        .map(|label| ListItem::new(Line::from(Span::styled(label, Style::default().fg(Color::White)))))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(app.step.title())
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.list_state.clone());

    if count > area.height.saturating_sub(2) as usize {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut app.scroll_state.clone(),
        );
    }
}

pub fn render_query_input(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let title = match app.content {
        Some(ContentChoice::Series) => "Search series",
        _ => "Search movies",
    };

    let input = Paragraph::new(app.query_input.as_str())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(input, chunks[0]);

    if !app.show_help {
        let x = chunks[0].x + 1 + app.query_input.chars().count() as u16;
        f.set_cursor_position((x.min(chunks[0].right().saturating_sub(2)), chunks[0].y + 1));
    }
}

pub fn render_magnet(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    if let Some(server) = &app.selected_server {
        lines.push(Line::from(vec![
            Span::styled("Server:  ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{} [{}]", server.server, server.quality)),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        app.magnet.clone().unwrap_or_default(),
        Style::default().fg(Color::Green),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Step::Magnet.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ])
}

fn link_lines(view: &LinkView) -> Vec<Line<'_>> {
    let mut lines = vec![field("Title:    ", view.info.display())];
    if let Some(code) = &view.episode_code {
        lines.push(field("Episode:  ", code.clone()));
    }
    lines.push(field("Quality:  ", view.quality.label().to_string()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Link:", Style::default().fg(Color::Gray))));
    lines.push(Line::from(Span::styled(
        view.link.as_str(),
        Style::default().fg(Color::Green),
    )));
    lines.push(Line::from(""));

    match &view.metadata {
        MetadataState::Disabled => {}
        MetadataState::Pending => lines.push(Line::from(Span::styled(
            "Looking up metadata...",
            Style::default().fg(Color::Gray),
        ))),
        MetadataState::Unavailable(reason) => lines.push(Line::from(Span::styled(
            format!("Metadata unavailable: {reason}"),
            Style::default().fg(Color::Yellow),
        ))),
        MetadataState::Found(metadata) => {
            let heading = match &metadata.year {
                Some(year) => format!("{} ({})", metadata.title, year),
                None => metadata.title.clone(),
            };
            lines.push(Line::from(Span::styled(
                heading,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            if !metadata.overview.is_empty() {
                lines.push(Line::from(metadata.overview.as_str()));
            }
            if let Some(poster) = &metadata.poster_url {
                lines.push(Line::from(""));
                lines.push(field("Poster:   ", poster.clone()));
            }
        }
    }

    lines
}

pub fn render_link_view(f: &mut Frame, area: Rect, app: &App) {
    let lines = app.link_view.as_ref().map(link_lines).unwrap_or_default();

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Step::Link.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn controls_hint(app: &App) -> &'static str {
    match app.step {
        Step::Query => "Type, ENTER to search, Esc to quit",
        Step::Magnet | Step::Link => "n for a new lookup, h for help, q to quit",
        _ => "ENTER to select, h for help, q to quit",
    }
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let (text, style) = match &app.status_message {
        Some(message) => (message.clone(), Style::default().fg(Color::Cyan)),
        None => (app.step.title().to_string(), Style::default().fg(Color::Green)),
    };
    let status = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[0]);

    let controls = Paragraph::new(controls_hint(app))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}

pub fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 50, f.area());

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Cine Finder - Help",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Up/k    - Move up"),
        Line::from("  Down/j  - Move down"),
        Line::from("  Enter   - Select / search"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  n       - Start a new lookup"),
        Line::from("  h/F1    - Toggle this help"),
        Line::from("  q/Esc   - Quit application"),
        Line::from(""),
        Line::from("Storage links are built from the listing link and the"),
        Line::from("release name; metadata needs an API key in the config."),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press Esc or h to close",
            Style::default().fg(Color::Gray),
        )]),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::link::LinkComposer;
    use crate::listing::FileEntry;
    use crate::title::TitleNormalizer;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_content_menu_renders() {
        let app = App::new(LinkComposer::default(), TitleNormalizer::default(), false);
        let screen = render(&app);
        assert!(screen.contains("Search movies"));
        assert!(screen.contains("Browse storage folder"));
    }

    #[test]
    fn test_link_view_renders() {
        let mut app = App::new(LinkComposer::default(), TitleNormalizer::default(), false);
        app.load_listing(vec![FileEntry::new(
            "Movie.2019.1080p/",
            "https://s.example/Movie.2019.1080p/",
        )]);
        app.on_enter();
        app.on_enter();
        app.on_enter();

        let screen = render(&app);
        assert!(screen.contains("Movie (2019)"));
        assert!(screen.contains("Movie.2019.1080p.mkv"));
    }
}
