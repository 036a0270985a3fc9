use crate::analytics::{GroupTotal, Heatmap};
use crate::app_state::{App, FocusArea, InputMode, ViewMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, List, ListItem, Paragraph, Sparkline},
    Frame,
};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // 顶部标题栏
            Constraint::Min(0),     // 中间内容区域
            Constraint::Length(10), // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    let middle_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn panel<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(if app.focus_area == FocusArea::MainView {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        })
}

fn group_lines(title: &str, groups: &[GroupTotal]) -> Vec<Line<'static>> {
    let mut lines = vec![heading(title)];
    if groups.is_empty() {
        lines.push(Line::from("  (无数据)"));
    }
    for g in groups {
        lines.push(Line::from(vec![
            Span::raw(format!("  {:<30}", g.key)),
            Span::styled(
                format!("{:>7} 单 ", g.orders),
                Style::default().fg(Color::White),
            ),
            Span::styled(
                format!("{:>13}", g.revenue.to_string()),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!(" {:>5.1}%", g.share * 100.0),
                Style::default().fg(Color::Magenta),
            ),
        ]));
    }
    lines
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let mut spans = vec![
        Span::styled(
            " shopsynth 订单看板 ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} | {} 行 | 筛选: {}",
            app.dataset_path.display(),
            app.snapshot.rows_total,
            app.snapshot.filter
        )),
    ];
    if app.loading {
        spans.push(Span::styled("  ⟳ 处理中", Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(title)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let menu_items: Vec<ListItem> = ViewMode::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = *view == app.view_mode;

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            ListItem::new(format!("{}{} {}", prefix, i + 1, view.title())).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "菜单 (Enter 确认)"
    } else {
        "菜单 (← 切换)"
    };

    let menu =
        List::new(menu_items).block(Block::default().borders(Borders::ALL).title(title).style(
            if app.focus_area == FocusArea::Menu {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            },
        ));
    f.render_widget(menu, area);
}

fn render_main_view(f: &mut Frame, area: Rect, app: &App) {
    if app.orders.is_empty() {
        let msg = if app.loading {
            "正在加载数据集..."
        } else {
            "暂无数据，输入 /reload 或 /generate 加载"
        };
        let p = Paragraph::new(msg).block(panel(app, app.view_mode.title().to_string()));
        f.render_widget(p, area);
        return;
    }
    match app.view_mode {
        ViewMode::Overview => render_overview(f, area, app),
        ViewMode::Trends => render_trends(f, area, app),
        ViewMode::Products => render_products(f, area, app),
        ViewMode::Markets => render_markets(f, area, app),
        ViewMode::Heatmap => render_heatmap(f, area, app),
    }
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let k = &app.snapshot.kpis;
    let delta = |pct: Option<f64>| match pct {
        Some(d) if d >= 0.0 => {
            Span::styled(format!("{:+.1}%", d), Style::default().fg(Color::Green))
        }
        Some(d) => Span::styled(format!("{:+.1}%", d), Style::default().fg(Color::Red)),
        None => Span::raw("N/A"),
    };
    let delta_line = |label: &str, pct: Option<f64>| {
        Line::from(vec![
            Span::styled(
                format!("  {:<14}", label),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            delta(pct),
        ])
    };
    let kpi = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(
                format!("  {:<14}", label),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(value, Style::default().fg(Color::Cyan)),
        ])
    };
    let lines = vec![
        heading("--- 核心指标 ---"),
        Line::from(""),
        kpi("总收入", k.total_revenue.to_string()),
        kpi("订单数", k.total_orders.to_string()),
        kpi("平均客单价", k.avg_order_value.to_string()),
        kpi("客单价中位数", k.median_order_value.to_string()),
        kpi("顾客数", k.unique_customers.to_string()),
        kpi(
            "最畅销商品",
            k.best_product.clone().unwrap_or_else(|| "-".to_string()),
        ),
        delta_line("近30天收入", k.revenue_delta_pct),
        delta_line("近30天订单", k.orders_delta_pct),
    ];
    f.render_widget(
        Paragraph::new(lines).block(panel(app, "概览 (f 状态, g 品类, x 清除)".to_string())),
        cols[0],
    );

    let mut right = group_lines("订单状态", &app.snapshot.by_status);
    right.push(Line::from(""));
    right.extend(group_lines("配送方式", &app.snapshot.by_shipping));
    right.push(Line::from(""));
    right.extend(group_lines("支付方式", &app.snapshot.by_payment));
    f.render_widget(
        Paragraph::new(right)
            .block(panel(app, "构成 (↑↓ 滚动)".to_string()))
            .scroll((app.scroll, 0)),
        cols[1],
    );
}

fn render_trends(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    let monthly = &app.snapshot.monthly;
    let values: Vec<u64> = monthly
        .iter()
        .map(|m| m.revenue.0.max(0) as u64 / 100)
        .collect();
    let span = match (monthly.first(), monthly.last()) {
        (Some(a), Some(b)) => format!("{} .. {}", a.month, b.month),
        _ => String::new(),
    };
    let spark = Sparkline::default()
        .block(panel(app, format!("月度收入 {}", span)))
        .data(&values)
        .style(Style::default().fg(Color::Magenta));
    f.render_widget(spark, rows[0]);

    let mut lines = vec![heading("月份       订单数          收入     客单价")];
    for m in monthly {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<8}", m.month), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:>9}", m.orders)),
            Span::styled(
                format!("{:>14}", m.revenue.to_string()),
                Style::default().fg(Color::Green),
            ),
            Span::raw(format!("{:>11}", m.avg_order_value.to_string())),
        ]));
    }
    f.render_widget(
        Paragraph::new(lines)
            .block(panel(app, "月度明细 (↑↓ 滚动)".to_string()))
            .scroll((app.scroll, 0)),
        rows[1],
    );
}

fn render_products(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(0)])
        .split(area);

    let data: Vec<(&str, u64)> = app
        .snapshot
        .by_category
        .iter()
        .map(|g| (g.key.as_str(), g.revenue.0.max(0) as u64 / 100))
        .collect();
    let chart = BarChart::default()
        .block(panel(app, "品类收入 ($)".to_string()))
        .data(data.as_slice())
        .bar_width(11)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(chart, rows[0]);

    f.render_widget(
        Paragraph::new(group_lines("畅销商品 Top 10", &app.snapshot.top_products))
            .block(panel(app, "商品 (↑↓ 滚动)".to_string()))
            .scroll((app.scroll, 0)),
        rows[1],
    );
}

fn render_markets(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    f.render_widget(
        Paragraph::new(group_lines("国家/地区 Top 10", &app.snapshot.top_countries))
            .block(panel(app, "市场".to_string()))
            .scroll((app.scroll, 0)),
        cols[0],
    );

    let mut lines = vec![heading("折扣码使用")];
    if app.snapshot.discount_usage.is_empty() {
        lines.push(Line::from("  (无数据)"));
    }
    for c in &app.snapshot.discount_usage {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", c.code), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{:>7} 单", c.orders)),
            Span::styled(
                format!("{:>12} 优惠", c.discount_total.to_string()),
                Style::default().fg(Color::Red),
            ),
        ]));
    }
    f.render_widget(
        Paragraph::new(lines)
            .block(panel(app, "促销".to_string()))
            .scroll((app.scroll, 0)),
        cols[1],
    );
}

fn heat_cell(count: u32, max: u32) -> Span<'static> {
    const SHADES: [Color; 5] = [
        Color::DarkGray,
        Color::Blue,
        Color::Cyan,
        Color::Yellow,
        Color::Red,
    ];
    let level = if max == 0 {
        0
    } else {
        ((count as u64 * 4 + max as u64 / 2) / max as u64) as usize
    };
    Span::styled("██ ", Style::default().fg(SHADES[level.min(4)]))
}

pub fn heatmap_lines(h: &Heatmap) -> Vec<Line<'static>> {
    let max = h.max();
    let mut header = vec![Span::raw("     ")];
    header.extend((0..24).map(|hour| Span::raw(format!("{:02} ", hour))));
    let mut lines = vec![Line::from(header)];
    for (day, row) in h.counts.iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!("{:<5}", WEEKDAYS[day]),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        spans.extend(row.iter().map(|&c| heat_cell(c, max)));
        let total: u32 = row.iter().sum();
        spans.push(Span::raw(format!(" {:>6}", total)));
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("单格最大订单数: {}", max)));
    lines
}

fn render_heatmap(f: &mut Frame, area: Rect, app: &App) {
    f.render_widget(
        Paragraph::new(heatmap_lines(&app.snapshot.heatmap))
            .block(panel(app, "下单热力图 (星期 × 小时)".to_string())),
        area,
    );
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let cur = app.command_cursor.min(app.command_input.len());
        let (left, right) = app.command_input.split_at(cur);
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }

        vec![
            Line::from(spans),
            Line::from("Enter执行 Esc取消 Tab补全 ←→光标 Home/End ↑历史 ↓下一条"),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式, /help 查看命令)"),
            ]),
            Line::from("1-5视图 f状态 g品类 x清除筛选 r重载 ←→切换 ↑↓导航 q退出"),
        ]
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式"
            } else {
                "命令输入"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with('✓') {
                Style::default().fg(Color::Green)
            } else if msg.starts_with('✗') {
                Style::default().fg(Color::Red)
            } else if msg.starts_with('⚠') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppEvent;
    use crate::generate::service::generate_orders;
    use crate::generate::GeneratorConfig;
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn renders_every_view() {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        let mut app = App::new(PathBuf::from("orders.csv"), cmd_tx, evt_rx);
        let orders = generate_orders(&GeneratorConfig {
            rows: 800,
            seed: Some(5),
            ..Default::default()
        })
        .unwrap();
        app.handle_event(AppEvent::Dataset {
            path: PathBuf::from("orders.csv"),
            orders: Arc::new(orders),
        });

        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        let expected = ["Delivered", "2024-07", "Skincare", "United States", "Mon"];
        for (i, needle) in expected.iter().enumerate() {
            app.handle_key_event(KeyCode::Char(char::from(b'1' + i as u8)));
            terminal.draw(|f| draw(f, &app)).unwrap();
            let text = screen_text(&terminal);
            assert!(text.contains(needle), "view {} missing {}", i + 1, needle);
        }
    }

    #[test]
    fn renders_empty_state() {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        let app = App::new(PathBuf::from("orders.csv"), cmd_tx, evt_rx);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(screen_text(&terminal).contains("/generate"));
    }

    #[test]
    fn heatmap_has_one_row_per_weekday() {
        let mut h = Heatmap::default();
        h.counts[4][20] = 9;
        let lines = heatmap_lines(&h);
        assert_eq!(lines.len(), 1 + 7 + 2);
        let friday: String = lines[5].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(friday.starts_with("Fri"));
        assert!(friday.trim_end().ends_with('9'));
    }
}
