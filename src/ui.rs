use crate::app::{App, ModalState, PaneFocus};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};

const HELP_LINES: &[(&str, &str)] = &[
    ("j/k, Up/Down", "move selection"),
    ("h/l, Left/Right", "collapse or parent / expand or first child"),
    ("Home/End, g/G", "first / last row"),
    ("PgUp/PgDn", "move one page"),
    ("Enter", "toggle a tree, preview a blob"),
    ("Space", "toggle the selected tree"),
    ("E / C", "expand all / collapse all"),
    ("/", "filter by path (Enter keeps, Esc restores)"),
    ("Tab", "cycle focus: list, preview, log"),
    ("r", "reload the revision"),
    ("mouse", "click selects, [+]/[-] toggles, double click opens"),
    ("q, Ctrl+C", "quit"),
];

pub fn draw(frame: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(outer[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main[1]);

    draw_list(frame, app, main[0]);
    draw_detail(frame, app, right[0]);
    draw_logs(frame, app, right[1]);
    draw_status_bar(frame, app, outer[1]);
    draw_modal(frame, app);
}

fn border_style(app: &App, pane: PaneFocus) -> Style {
    if app.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_list(frame: &mut Frame, app: &mut App, area: Rect) {
    app.list_area = area;
    app.tree
        .set_viewport_extent(u64::from(area.height.saturating_sub(2)));

    // only the rendered window is turned into list items
    let (start, labels) = app.rendered_labels();
    let items: Vec<ListItem> = labels.into_iter().map(ListItem::new).collect();
    let visible = app.tree.window().visible_range(app.tree.metrics());

    let title = if app.list_filter().is_empty() {
        format!(" {} @ {} ", app.repo_label, app.revision)
    } else {
        format!(
            " {} @ {} [filter: {}] ",
            app.repo_label,
            app.revision,
            app.list_filter()
        )
    };

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style(app, PaneFocus::List)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .highlight_spacing(HighlightSpacing::Always);

    let selected = app
        .tree
        .selected_index()
        .filter(|index| visible.contains(index))
        .map(|index| index - start);
    let mut state = ListState::default()
        .with_offset(visible.start.saturating_sub(start))
        .with_selected(selected);

    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let lines = if app.detail_text.is_empty() {
        vec![
            Line::from("Nothing previewed yet."),
            Line::from("Select a blob, or press Enter on it."),
        ]
    } else {
        numbered_lines(&app.detail_text)
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!(" {} ", app.detail_title))
                .borders(Borders::ALL)
                .border_style(border_style(app, PaneFocus::Detail)),
        )
        .scroll((app.detail_scroll.min(u16::MAX as usize) as u16, 0))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn numbered_lines(text: &str) -> Vec<Line<'static>> {
    let width = text.lines().count().max(1).to_string().len();
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(line.to_string()),
            ])
        })
        .collect()
}

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let rows = usize::from(area.height.saturating_sub(2)).max(1);
    let end = app.logs.len().saturating_sub(app.log_tail_offset);
    let start = end.saturating_sub(rows);
    let lines: Vec<Line> = app.logs[start..end]
        .iter()
        .map(|line| Line::from(line.as_str()))
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(" Log ")
            .borders(Borders::ALL)
            .border_style(border_style(app, PaneFocus::Log)),
    );

    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let busy = if app.busy { "BUSY" } else { "IDLE" };
    let position = match app.tree.selected_index() {
        Some(index) => format!("{}/{}", index + 1, app.tree.len()),
        None => format!("-/{}", app.tree.len()),
    };
    let text = Line::from(vec![
        Span::styled(
            format!(" {busy} "),
            if app.busy {
                Style::default().bg(Color::Yellow).fg(Color::Black)
            } else {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            },
        ),
        Span::raw("  "),
        Span::styled(position, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(
            "? help | / filter | E/C expand/collapse all | tab focus | r reload | q quit",
            Style::default().fg(Color::Gray),
        ),
    ]);

    let paragraph = Paragraph::new(text).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn draw_modal(frame: &mut Frame, app: &App) {
    match &app.modal {
        ModalState::None => {}
        ModalState::Help => {
            let area = centered_rect(70, 60, frame.area());
            frame.render_widget(Clear, area);

            let lines: Vec<Line> = HELP_LINES
                .iter()
                .map(|(keys, description)| {
                    Line::from(vec![
                        Span::styled(format!("{keys:<18}"), Style::default().fg(Color::Yellow)),
                        Span::raw(*description),
                    ])
                })
                .collect();

            let p = Paragraph::new(lines)
                .block(
                    Block::default()
                        .title(" Keys (any key closes) ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan)),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(p, area);
        }
        ModalState::Filter { value, .. } => {
            let area = centered_rect(60, 20, frame.area());
            frame.render_widget(Clear, area);

            let lines = vec![
                Line::from(format!("> {value}")).style(Style::default().fg(Color::Yellow)),
                Line::from(format!("{} rows match", app.tree.len())),
                Line::from("Enter: keep  Esc: restore"),
            ];

            let p = Paragraph::new(lines).block(
                Block::default()
                    .title(" Filter by path ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightBlue)),
            );
            frame.render_widget(p, area);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
