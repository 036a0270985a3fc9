use crate::analytics::{DashboardSnapshot, OrderFilter};
use crate::commands::{AppCommand, FilterCommand, HELP};
use crate::dataset::OrderRecord;
use crossterm::event::KeyCode;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ViewMode {
    Overview,
    Trends,
    Products,
    Markets,
    Heatmap,
}

impl ViewMode {
    pub const ALL: [ViewMode; 5] = [
        ViewMode::Overview,
        ViewMode::Trends,
        ViewMode::Products,
        ViewMode::Markets,
        ViewMode::Heatmap,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Overview => "概览",
            ViewMode::Trends => "月度趋势",
            ViewMode::Products => "商品",
            ViewMode::Markets => "市场",
            ViewMode::Heatmap => "下单热力图",
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Message(String),
    Error(String),
    Dataset {
        path: PathBuf,
        orders: Arc<Vec<OrderRecord>>,
    },
}

pub struct App {
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub dataset_path: PathBuf,
    pub orders: Arc<Vec<OrderRecord>>,
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub filter: OrderFilter,
    pub snapshot: DashboardSnapshot,
    pub loading: bool,
    pub scroll: u16,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        dataset_path: PathBuf,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        App {
            view_mode: ViewMode::Overview,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            dataset_path,
            orders: Arc::new(Vec::new()),
            categories: Vec::new(),
            countries: Vec::new(),
            filter: OrderFilter::default(),
            snapshot: DashboardSnapshot::default(),
            loading: false,
            scroll: 0,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages: vec!["应用已启动".to_string()],
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) | AppEvent::Message(msg) => self.add_log(msg),
            AppEvent::Error(msg) => {
                self.loading = false;
                self.add_log(format!("✗ {}", msg));
            }
            AppEvent::Dataset { path, orders } => {
                self.loading = false;
                self.add_log(format!("✓ 已加载 {} 条订单: {}", orders.len(), path.display()));
                self.set_orders(path, orders);
            }
        }
    }

    pub fn set_orders(&mut self, path: PathBuf, orders: Arc<Vec<OrderRecord>>) {
        let distinct = |f: fn(&OrderRecord) -> &str| -> Vec<String> {
            orders
                .iter()
                .map(f)
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        self.categories = distinct(|o| o.product_category.as_str());
        self.countries = distinct(|o| o.customer_country.as_str());
        self.dataset_path = path;
        self.orders = orders;
        // Selections that no longer exist in the new dataset are dropped.
        let (cats, ctys) = (&self.categories, &self.countries);
        self.filter.categories.retain(|c| cats.contains(c));
        self.filter.countries.retain(|c| ctys.contains(c));
        self.refresh_snapshot();
    }

    pub fn refresh_snapshot(&mut self) {
        self.snapshot = DashboardSnapshot::compute(&self.orders, &self.filter);
        self.scroll = 0;
    }

    fn send(&mut self, cmd: AppCommand) {
        if matches!(cmd, AppCommand::Reload | AppCommand::Generate { .. }) {
            self.loading = true;
        }
        if self.cmd_tx.send(cmd).is_err() {
            self.loading = false;
            self.add_log("✗ 后台任务已退出".to_string());
        }
    }

    /// Applies a filter edit locally. Names are matched case-insensitively
    /// against the values present in the loaded dataset.
    pub fn apply_filter_command(&mut self, cmd: FilterCommand) {
        fn resolve(known: &[String], wanted: &str) -> Option<String> {
            known
                .iter()
                .find(|k| k.eq_ignore_ascii_case(wanted.trim()))
                .cloned()
        }

        match cmd {
            FilterCommand::Clear => self.filter.clear(),
            FilterCommand::Category(name) => match resolve(&self.categories, &name) {
                Some(c) => self.filter.categories = vec![c],
                None => {
                    self.add_log(format!("✗ 未知品类: {}", name));
                    return;
                }
            },
            FilterCommand::Country(name) => match resolve(&self.countries, &name) {
                Some(c) => self.filter.countries = vec![c],
                None => {
                    self.add_log(format!("✗ 未知国家: {}", name));
                    return;
                }
            },
            FilterCommand::Status(st) => self.filter.statuses = vec![st],
            FilterCommand::From(d) => self.filter.from = Some(d),
            FilterCommand::To(d) => self.filter.to = Some(d),
            FilterCommand::Reset(field) => match field.as_str() {
                "category" => self.filter.categories.clear(),
                "country" => self.filter.countries.clear(),
                "status" => self.filter.statuses.clear(),
                "from" => self.filter.from = None,
                _ => self.filter.to = None,
            },
        }
        if let (Some(f), Some(t)) = (self.filter.from, self.filter.to) {
            if f > t {
                self.add_log(format!("⚠ 日期区间为空: {} > {}", f, t));
            }
        }
        self.refresh_snapshot();
        self.add_log(format!("筛选: {}", self.filter.describe()));
    }

    /// Runs one submitted command line. Returns true when the app should exit.
    pub fn submit_command(&mut self, line: &str) -> bool {
        let cmd =
            AppCommand::from_str(line).unwrap_or_else(|_| AppCommand::Unknown(line.to_string()));
        self.command_history.push(line.to_string());
        self.command_history_index = None;
        match cmd {
            AppCommand::Quit => return true,
            AppCommand::Help => self.add_log(HELP.to_string()),
            AppCommand::Filter(f) => self.apply_filter_command(f),
            AppCommand::Unknown(msg) => self.add_log(format!("✗ {}", msg)),
            other => self.send(other),
        }
        false
    }

    /// 获取当前的预测建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = ["reload", "generate", "validate", "filter", "help", "quit"];
        let input = self.command_input.trim_start();
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let trailing_space = input.ends_with(' ');
        fn complete(cands: &[&str], cur: &str) -> Option<String> {
            cands.iter().find_map(|c| {
                let head = c.get(..cur.len())?;
                let tail = c.get(cur.len()..)?;
                (head.eq_ignore_ascii_case(cur) && !tail.is_empty()).then(|| tail.to_string())
            })
        }

        match (parts.as_slice(), trailing_space) {
            ([cur], false) => complete(&commands[..], cur),
            (["filter"], true) => Some("category".to_string()),
            (["filter", cur], false) => complete(
                &["category", "country", "status", "from", "to", "clear", "reset"],
                cur,
            ),
            (["filter", "category"], true) => self.categories.first().cloned(),
            (["filter", "category", cur], false) => {
                let cands: Vec<&str> = self.categories.iter().map(|s| s.as_str()).collect();
                complete(&cands, cur)
            }
            (["filter", "status", cur], false) => {
                let cands: Vec<&str> = crate::dataset::OrderStatus::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect();
                complete(&cands, cur)
            }
            _ => None,
        }
    }

    fn select_view(&mut self, index: usize) {
        if let Some(view) = ViewMode::ALL.get(index) {
            self.view_mode = *view;
            self.menu_selected_index = index;
            self.scroll = 0;
        }
    }

    fn close_command_line(&mut self) {
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            match key {
                KeyCode::Enter => {
                    let cmd_owned = self.command_input.trim().to_string();
                    self.close_command_line();
                    if cmd_owned.is_empty() {
                        return false;
                    }
                    return self.submit_command(&cmd_owned);
                }
                KeyCode::Esc => self.close_command_line(),
                KeyCode::Tab => {
                    if let Some(hint) = self.get_completion_hint() {
                        let insert = format!("{} ", hint);
                        self.command_input.insert_str(self.command_cursor, &insert);
                        self.command_cursor += insert.len();
                    }
                }
                KeyCode::Up => {
                    if self.command_history.is_empty() {
                        return false;
                    }
                    let next = match self.command_history_index {
                        None => self.command_history.len().saturating_sub(1),
                        Some(i) => i.saturating_sub(1),
                    };
                    self.command_history_index = Some(next);
                    if let Some(cmd) = self.command_history.get(next) {
                        self.command_input = cmd.clone();
                        self.command_cursor = self.command_input.len();
                    }
                }
                KeyCode::Down => {
                    let Some(i) = self.command_history_index else {
                        return false;
                    };
                    let n = i + 1;
                    if n >= self.command_history.len() {
                        self.command_history_index = None;
                        self.command_input.clear();
                        self.command_cursor = 0;
                        return false;
                    }
                    self.command_history_index = Some(n);
                    self.command_input = self.command_history[n].clone();
                    self.command_cursor = self.command_input.len();
                }
                KeyCode::Backspace => {
                    if let Some((idx, _)) = self.command_input[..self.command_cursor]
                        .char_indices()
                        .next_back()
                    {
                        self.command_input.remove(idx);
                        self.command_cursor = idx;
                    }
                }
                KeyCode::Delete => {
                    if self.command_cursor < self.command_input.len() {
                        self.command_input.remove(self.command_cursor);
                    }
                }
                KeyCode::Left => {
                    if let Some((idx, _)) = self.command_input[..self.command_cursor]
                        .char_indices()
                        .next_back()
                    {
                        self.command_cursor = idx;
                    }
                }
                KeyCode::Right => {
                    if let Some(c) = self.command_input[self.command_cursor..].chars().next() {
                        self.command_cursor += c.len_utf8();
                    }
                }
                KeyCode::Home => self.command_cursor = 0,
                KeyCode::End => self.command_cursor = self.command_input.len(),
                KeyCode::Char(c) => {
                    self.command_input.insert(self.command_cursor, c);
                    self.command_cursor += c.len_utf8();
                }
                _ => {}
            }
            return false;
        }

        // 正常模式下的按键处理
        match key {
            KeyCode::Char('/') | KeyCode::Char(':') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else {
                    self.scroll = self.scroll.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index + 1 < ViewMode::ALL.len() {
                        self.menu_selected_index += 1;
                    }
                } else {
                    self.scroll = self.scroll.saturating_add(1);
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.focus_area == FocusArea::Menu {
                    self.select_view(self.menu_selected_index);
                    self.focus_area = FocusArea::MainView;
                }
            }
            KeyCode::Char(d @ '1'..='5') => {
                self.select_view(d as usize - '1' as usize);
            }
            KeyCode::Char('f') => {
                self.filter.cycle_status();
                self.refresh_snapshot();
            }
            KeyCode::Char('g') => {
                let cats = self.categories.clone();
                self.filter.cycle_category(&cats);
                self.refresh_snapshot();
            }
            KeyCode::Char('x') => {
                self.filter.clear();
                self.refresh_snapshot();
            }
            KeyCode::Char('r') => self.send(AppCommand::Reload),
            _ => {}
        }
        false
    }
}
