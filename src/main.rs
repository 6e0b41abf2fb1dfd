use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time;

use anyhow::Context;
use crossterm::cursor;
use crossterm::event;
use crossterm::execute;
use crossterm::style;
use crossterm::terminal;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use skipquadtree::SkipQuadTree;
use skipquadtree::camera;
use skipquadtree::camera::Camera;
use skipquadtree::camera::Viewport;
use skipquadtree::config::Config;
use skipquadtree::config::ViewConfig;
use skipquadtree::dump::LayerDump;
use skipquadtree::events::AppEvent;
use skipquadtree::events::CursorEvent;
use skipquadtree::events::Event;
use skipquadtree::events::TreeEvent;
use skipquadtree::io::convert_event;
use skipquadtree::quadtree::Aabb;
use skipquadtree::quadtree::Point;

const FRAMERATE: u32 = 60;
const FRAMETIME: time::Duration =
    time::Duration::from_millis(((1f64 / FRAMERATE as f64) * 1_000f64) as u64);

/// Terminal rows below the frame, for the status line
const STATUS_ROWS: u16 = 1;

const DEFAULT_CONFIG: &str = "skipquadtree.toml";

/// Puts the terminal back the way we found it, also on early returns.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

struct App {
    tree: SkipQuadTree,
    view: ViewConfig,
    cursor: Point,

    /// First corner of a rectangle being selected
    corner: Option<Point>,

    /// Last selected rectangle, and the points found in it
    selection: Option<(Aabb, Vec<Point>)>,

    /// Shown layer, where `0` is the finest
    layer: usize,

    /// Draw branch outlines, not just points
    show_layout: bool,

    status: String,
}

impl App {
    fn new(tree: SkipQuadTree, view: ViewConfig) -> Self {
        let cursor = tree.domain().midpoint();

        App {
            tree,
            view,
            cursor,
            corner: None,
            selection: None,
            layer: 0,
            show_layout: true,
            status: String::new(),
        }
    }

    fn handle_tree_event(&mut self, event: TreeEvent) {
        let p = self.cursor;

        match event {
            TreeEvent::Insert => {
                if self.tree.insert(p) {
                    self.status = format!("inserted {p:?}");
                } else {
                    warn!("rejected insert of {p:?}");
                    self.status = format!("could not insert {p:?}");
                }
            }
            TreeEvent::Delete => {
                if self.tree.delete(p, self.view.delete_eps) {
                    self.status = format!("deleted near {p:?}");
                } else {
                    self.status = format!("nothing to delete near {p:?}");
                }
            }
            TreeEvent::Select => match self.corner.take() {
                None => {
                    self.corner = Some(p);
                    self.selection = None;
                    self.status = format!("first corner at {p:?}");
                }
                Some(corner) => {
                    let found = self.tree.range_query(corner, p, self.view.query_eps);
                    info!("query {corner:?} to {p:?} found {} points", found.len());

                    self.status = format!("{} points selected", found.len());
                    self.selection = Some((Aabb::from_corners(corner, p), found));
                }
            },
            TreeEvent::Clear => {
                self.tree.clear();
                self.corner = None;
                self.selection = None;
                self.status = "cleared".to_string();
            }
        }

        self.layer = self.layer.min(self.tree.height().saturating_sub(1));
    }

    fn move_cursor(&mut self, event: CursorEvent) {
        let step = self.view.step;

        match event {
            CursorEvent::Up => self.cursor.y += step,
            CursorEvent::Down => self.cursor.y -= step,
            CursorEvent::Left => self.cursor.x -= step,
            CursorEvent::Right => self.cursor.x += step,
        }
    }

    fn shift_layer(&mut self, delta: i32) {
        let top = self.tree.height().saturating_sub(1) as i64;
        self.layer = (self.layer as i64 + delta as i64).clamp(0, top) as usize;
    }

    fn toggle_layout(&mut self) {
        self.show_layout = !self.show_layout;

        self.status = match self.show_layout {
            true => "showing layout".to_string(),
            false => "hiding layout".to_string(),
        };
    }

    fn dump_layer(&mut self) {
        match self.tree.layer(self.layer) {
            Some(layer) => {
                info!("layer {}:\n{}", self.layer, LayerDump(layer));
                self.status = format!("dumped layer {}", self.layer);
            }
            None => self.status = "empty tree".to_string(),
        }
    }

    fn draw(&self, cam: &mut Camera) {
        let view = Viewport::fit(&self.tree.domain(), cam.width(), cam.height());

        cam.reset();

        if let Some(layer) = self.tree.layer(self.layer) {
            camera::draw_layer(cam, &view, layer, self.show_layout);
        }

        if let Some((rect, found)) = &self.selection {
            camera::draw_selection(cam, &view, rect);

            for p in found {
                let (x, y) = view.to_pixel(cam, p);
                cam.draw_cross(x, y);
            }
        }

        if let Some(corner) = self.corner {
            camera::draw_selection(cam, &view, &Aabb::from_corners(corner, self.cursor));
        }

        let (x, y) = view.to_pixel(cam, &self.cursor);
        cam.draw_cross(x, y);
    }

    fn status_line(&self) -> String {
        format!(
            "({}, {}) layer {}/{} points {} nodes {} | {}",
            self.cursor.x,
            self.cursor.y,
            self.layer,
            self.tree.height(),
            self.tree.len(),
            self.tree.node_count(),
            self.status
        )
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

fn frame_size((cols, rows): (u16, u16)) -> (usize, usize) {
    let rows = rows.saturating_sub(STATUS_ROWS);

    (cols as usize * 2, rows as usize * 4)
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    init_logging(config.view.log_file.as_deref())?;

    let tree = config.tree.build().context("Failed to build the tree")?;
    info!("starting with {:?}", tree);

    let mut app = App::new(tree, config.view);

    let _raw = RawMode::enable().context("Failed to set up the terminal")?;
    let mut stdout = io::stdout();

    let (w, h) = frame_size(terminal::size()?);
    let mut cam = Camera::new(w, h);

    loop {
        let t = time::Instant::now();

        // Poll event for as long as FRAMETIME
        let event = if event::poll(FRAMETIME)? {
            convert_event(event::read()?)
        } else {
            None
        };

        match event {
            None => {}
            Some(Event::AppEvent(AppEvent::Exit)) => break,
            Some(Event::AppEvent(AppEvent::CursorEvent(e))) => app.move_cursor(e),
            Some(Event::AppEvent(AppEvent::Layer(delta))) => app.shift_layer(delta),
            Some(Event::AppEvent(AppEvent::Dump)) => app.dump_layer(),
            Some(Event::AppEvent(AppEvent::ToggleLayout)) => app.toggle_layout(),
            Some(Event::AppEvent(AppEvent::Resize { cols, rows })) => {
                let (w, h) = frame_size((cols, rows));
                cam.resize(w, h);
            }
            Some(Event::TreeEvent(e)) => app.handle_tree_event(e),
        }

        app.draw(&mut cam);
        let s = cam.render();

        execute!(
            stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
        )?;

        for line in s.lines() {
            execute!(stdout, style::Print(line), cursor::MoveToNextLine(1))?;
        }

        execute!(stdout, style::Print(app.status_line()))?;

        thread::sleep(FRAMETIME.saturating_sub(t.elapsed()));
    }

    Ok(())
}
