use chrono::TimeZone;
use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row,
        Table, TableState, Tabs, Wrap,
    },
    Frame,
};

use super::state::{Modal, Section};
use super::usage::format_bytes;
use super::App;

pub fn draw<B>(rect: &mut Frame<B>, app: &App)
where
    B: Backend,
{
    let size = rect.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    draw_tabs(rect, chunks[0], app);
    match app.section() {
        Section::Containers => draw_containers(rect, chunks[1], app),
        Section::Images => draw_images(rect, chunks[1], app),
        Section::Volumes => draw_volumes(rect, chunks[1], app),
        Section::Networks => draw_networks(rect, chunks[1], app),
        Section::Compose => draw_compose(rect, chunks[1], app),
    }
    if let Some(modal) = app.modal() {
        draw_modal(rect, centered_rect(80, 80, size), modal, app);
    }
    draw_footer(rect, chunks[2], app);
}

fn draw_tabs<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let titles = Section::ALL
        .iter()
        .map(|s| Spans::from(Span::raw(s.title())))
        .collect();
    let title = if app.is_loading() {
        "dockboard (loading...)"
    } else {
        "dockboard"
    };
    let tabs = Tabs::new(titles)
        .select(app.section().index())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, chunk);
}

fn header(cells: &[&'static str]) -> Row<'static> {
    let cells = cells
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::LightCyan)));
    Row::new(cells).height(1).bottom_margin(1)
}

fn render_table<B>(
    frame: &mut Frame<B>,
    chunk: Rect,
    app: &App,
    table: Table,
    len: usize,
) where
    B: Backend,
{
    let mut table_state = TableState::default();
    if len > 0 {
        table_state.select(Some(app.selected()));
    }
    let table = table
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(2);
    frame.render_stateful_widget(table, chunk, &mut table_state);
}

fn draw_empty<B>(frame: &mut Frame<B>, chunk: Rect, title: &str, text: &str)
where
    B: Backend,
{
    let p = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP).title(title.to_string()));
    frame.render_widget(p, chunk);
}

fn state_color(state: &str) -> Color {
    match state {
        "running" => Color::Green,
        "paused" => Color::Yellow,
        "restarting" => Color::LightGreen,
        "removing" => Color::LightRed,
        "exited" | "dead" => Color::Red,
        _ => Color::Gray,
    }
}

fn short_id(id: &str) -> String {
    id.trim_start_matches("sha256:").chars().take(12).collect()
}

fn draw_containers<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let containers = app.containers();
    if containers.is_empty() {
        draw_empty(frame, chunk, "Containers", "No containers found.");
        return;
    }
    let rows = containers.iter().map(|c| {
        let state = c.summary.state.clone().unwrap_or_default();
        Row::new(vec![
            Cell::from(Span::styled(" ", Style::default().bg(state_color(&state)))),
            Cell::from(short_id(c.id())),
            Cell::from(c.name()),
            Cell::from(c.summary.image.clone().unwrap_or_default()),
            Cell::from(state),
            Cell::from(c.summary.status.clone().unwrap_or_default()),
            Cell::from(c.health.clone()),
        ])
    });
    let table = Table::new(rows)
        .header(header(&["", "ID", "NAME", "IMAGE", "STATE", "STATUS", "HEALTH"]))
        .block(Block::default().borders(Borders::TOP).title("Containers"))
        .widths(&[
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Length(10),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ]);
    render_table(frame, chunk, app, table, containers.len());
}

fn draw_images<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let images = app.images();
    if images.is_empty() {
        draw_empty(frame, chunk, "Images", "No images found.");
        return;
    }
    let rows = images.iter().map(|i| {
        let created = chrono::Local
            .timestamp_opt(i.created, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let tags = if i.repo_tags.is_empty() {
            "<none>".to_string()
        } else {
            i.repo_tags.join(", ")
        };
        Row::new(vec![
            Cell::from(short_id(&i.id)),
            Cell::from(tags),
            Cell::from(format_bytes(u64::try_from(i.size).unwrap_or(0))),
            Cell::from(created),
        ])
    });
    let table = Table::new(rows)
        .header(header(&["ID", "TAGS", "SIZE", "CREATED"]))
        .block(Block::default().borders(Borders::TOP).title("Images"))
        .widths(&[
            Constraint::Length(12),
            Constraint::Percentage(50),
            Constraint::Length(10),
            Constraint::Length(16),
        ]);
    render_table(frame, chunk, app, table, images.len());
}

fn draw_volumes<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let volumes = app.volumes();
    if volumes.is_empty() {
        draw_empty(frame, chunk, "Volumes", "No volumes found.");
        return;
    }
    let rows = volumes.iter().map(|v| {
        Row::new(vec![
            Cell::from(v.name.clone()),
            Cell::from(v.driver.clone()),
            Cell::from(v.mountpoint.clone()),
        ])
    });
    let table = Table::new(rows)
        .header(header(&["NAME", "DRIVER", "MOUNTPOINT"]))
        .block(Block::default().borders(Borders::TOP).title("Volumes"))
        .widths(&[
            Constraint::Percentage(35),
            Constraint::Length(10),
            Constraint::Percentage(55),
        ]);
    render_table(frame, chunk, app, table, volumes.len());
}

fn draw_networks<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let networks = app.networks();
    if networks.is_empty() {
        draw_empty(frame, chunk, "Networks", "No networks found.");
        return;
    }
    let rows = networks.iter().map(|n| {
        Row::new(vec![
            Cell::from(short_id(n.id.as_deref().unwrap_or_default())),
            Cell::from(n.name.clone().unwrap_or_default()),
            Cell::from(n.driver.clone().unwrap_or_default()),
            Cell::from(n.scope.clone().unwrap_or_default()),
        ])
    });
    let table = Table::new(rows)
        .header(header(&["ID", "NAME", "DRIVER", "SCOPE"]))
        .block(Block::default().borders(Borders::TOP).title("Networks"))
        .widths(&[
            Constraint::Length(12),
            Constraint::Percentage(40),
            Constraint::Length(10),
            Constraint::Length(8),
        ]);
    render_table(frame, chunk, app, table, networks.len());
}

fn draw_compose<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)].as_ref())
        .split(chunk);

    let dir = if app.project_dir().is_empty() {
        Span::styled("<none>", Style::default().fg(Color::Gray))
    } else {
        Span::raw(app.project_dir().to_string())
    };
    let p = Paragraph::new(Spans::from(vec![Span::raw("Project directory: "), dir]))
        .block(Block::default().borders(Borders::TOP).title("Compose"));
    frame.render_widget(p, chunks[0]);

    let p = Paragraph::new(app.compose_output().to_string())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::TOP).title("Services"));
    frame.render_widget(p, chunks[1]);
}

fn draw_modal<B>(frame: &mut Frame<B>, area: Rect, modal: &Modal, app: &App)
where
    B: Backend,
{
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(modal.title());
    frame.render_widget(Clear, area);

    if let Modal::Services { units, .. } = modal {
        if !units.is_empty() {
            let items: Vec<ListItem> = units
                .iter()
                .map(|u| {
                    let color = if u.active == "active" {
                        Color::Green
                    } else {
                        Color::Gray
                    };
                    ListItem::new(Spans::from(vec![
                        Span::styled(format!("{:<10}", u.active), Style::default().fg(color)),
                        Span::raw(format!("{:<40} {}", u.name, u.description)),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut state = ListState::default();
            state.select(Some(app.modal_selected()));
            frame.render_stateful_widget(list, area, &mut state);
            return;
        }
    }

    let p = Paragraph::new(modal.body())
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.modal_scroll(), 0));
    frame.render_widget(p, area);
}

fn draw_footer<B>(frame: &mut Frame<B>, chunk: Rect, app: &App)
where
    B: Backend,
{
    if let Some(prompt) = app.prompt() {
        let p = Paragraph::new(prompt.input.clone())
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(format!("{} (Enter to confirm, Esc to cancel)", prompt.kind.title()))
                    .border_type(BorderType::Plain),
            );
        frame.render_widget(p, chunk);
        let x = chunk.x + u16::try_from(prompt.input.chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor(x.min(chunk.right().saturating_sub(1)), chunk.y + 1);
        return;
    }

    let (text, color) = match app.status() {
        Some(status) if status.is_error => (status.text.clone(), Color::LightRed),
        Some(status) => (status.text.clone(), Color::LightGreen),
        None => (app.actions().to_string(), Color::LightCyan),
    };
    let p = Paragraph::new(vec![Spans::from(Span::raw(text))])
        .style(Style::default().fg(color))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .style(Style::default().fg(Color::White))
                .title("Help")
                .border_type(BorderType::Plain),
        );
    frame.render_widget(p, chunk);
}

/// A rectangle of the given percentages of `r`, centered in it.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_shortened() {
        assert_eq!(short_id("sha256:0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn popup_is_centered() {
        let area = centered_rect(80, 80, Rect::new(0, 0, 100, 50));
        assert_eq!(area, Rect::new(10, 5, 80, 40));
    }
}
