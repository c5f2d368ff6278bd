//! A rendered stand-in for the game window. Frames are drawn from a small
//! board model and clicks mutate it, so action sequences run through the real
//! detection code.

use anyhow::Result;
use image::{Rgba, RgbaImage};
use mine_capture::{BoundingBox, Clock, FrameSource, Point, Pointer};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DESKTOP: Rgba<u8> = Rgba([80, 80, 85, 255]);
// Kept below the yellow button saturation so the field never reads as a button.
pub const TAN: Rgba<u8> = Rgba([200, 180, 140, 255]);
pub const PANEL: Rgba<u8> = Rgba([40, 40, 50, 255]);
pub const RED: Rgba<u8> = Rgba([220, 30, 30, 255]);
pub const GREEN: Rgba<u8> = Rgba([40, 200, 60, 255]);
pub const YELLOW: Rgba<u8> = Rgba([230, 200, 30, 255]);
pub const BLUE: Rgba<u8> = Rgba([30, 120, 230, 255]);

pub const FRAME: (u32, u32) = (600, 500);
pub const PLAY_AREA: BoundingBox = BoundingBox { x: 50, y: 40, width: 500, height: 420 };
/// Matches the dialog window of `PLAY_AREA`.
pub const DIALOG: BoundingBox = BoundingBox { x: 150, y: 145, width: 300, height: 210 };
pub const DIALOG_BUTTON: BoundingBox = BoundingBox { x: 280, y: 230, width: 40, height: 40 };
pub const SEARCH_BUTTON: BoundingBox = BoundingBox { x: 260, y: 390, width: 80, height: 50 };

const MARKER_SIZE: u32 = 16;
const CLICK_OFFSET_Y: i32 = 30;
const HIT_RADIUS: f64 = 20.0;

/// What happens to a mine when troops depart for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The mine turns green.
    Capture,
    /// The mine stays red.
    Repel,
    /// The marker disappears without turning green.
    Vanish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialog {
    Closed,
    Mine(Point),
    Depart(Point),
    Held(Point),
}

/// Where a marker drawn with its top-left corner at `corner` is detected.
pub fn detected_at(corner: Point) -> Point {
    corner.offset(MARKER_SIZE as i32 / 2 - 1, MARKER_SIZE as i32 / 2 - 1)
}

pub struct Board {
    /// Top-left corners of red markers.
    pub red: Vec<Point>,
    pub green: Vec<Point>,
    pub resolutions: VecDeque<Resolution>,
    pub batches: VecDeque<Vec<Point>>,
    pub search_visible: bool,
    pub dialogs_open: bool,
    /// Dialog buttons fade in this long after the dialog opens.
    pub button_delay: Duration,
    pub field_visible: bool,
    pub clicks: Vec<Point>,
    pub returned: u32,
    pub searches: u32,
    dialog: Dialog,
    dialog_since: Duration,
    elapsed: Rc<Cell<Duration>>,
}

impl Board {
    /// Virtual time since the board was created.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    fn button_ready(&self) -> bool {
        self.elapsed.get() >= self.dialog_since + self.button_delay
    }

    fn open(&mut self, dialog: Dialog) {
        self.dialog = dialog;
        self.dialog_since = self.elapsed.get();
    }

    fn render(&self) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(FRAME.0, FRAME.1, DESKTOP);
        if !self.field_visible {
            return frame;
        }
        fill(&mut frame, PLAY_AREA, TAN);
        for corner in &self.red {
            fill(&mut frame, marker_box(*corner), RED);
        }
        for corner in &self.green {
            fill(&mut frame, marker_box(*corner), GREEN);
        }
        if self.search_visible {
            fill(&mut frame, SEARCH_BUTTON, BLUE);
        }

        let button = match self.dialog {
            Dialog::Closed => return frame,
            Dialog::Mine(_) => RED,
            Dialog::Depart(_) => GREEN,
            Dialog::Held(_) => YELLOW,
        };
        fill(&mut frame, DIALOG, PANEL);
        if self.button_ready() {
            fill(&mut frame, DIALOG_BUTTON, button);
        }
        frame
    }

    fn click(&mut self, at: Point) {
        self.clicks.push(at);
        let on_button = self.button_ready() && DIALOG_BUTTON.contains(at);

        match self.dialog {
            Dialog::Mine(corner) if on_button => self.open(Dialog::Depart(corner)),
            Dialog::Depart(corner) if on_button => {
                self.dialog = Dialog::Closed;
                match self.resolutions.pop_front().unwrap_or(Resolution::Repel) {
                    Resolution::Capture => {
                        self.red.retain(|c| *c != corner);
                        self.green.push(corner);
                    }
                    Resolution::Repel => {}
                    Resolution::Vanish => self.red.retain(|c| *c != corner),
                }
            }
            Dialog::Held(corner) if on_button => {
                self.dialog = Dialog::Closed;
                self.green.retain(|c| *c != corner);
                self.returned += 1;
            }
            Dialog::Closed => self.click_field(at),
            // Tapping outside an open dialog dismisses it.
            _ => self.dialog = Dialog::Closed,
        }
    }

    fn click_field(&mut self, at: Point) {
        if self.search_visible && SEARCH_BUTTON.contains(at) {
            self.searches += 1;
            self.red = self.batches.pop_front().unwrap_or_default();
            return;
        }
        if !self.dialogs_open {
            return;
        }
        let target = at.offset(0, -CLICK_OFFSET_Y);
        let hit = |corners: &[Point]| {
            corners
                .iter()
                .copied()
                .find(|c| detected_at(*c).distance(target) <= HIT_RADIUS)
        };
        if let Some(corner) = hit(&self.red) {
            self.open(Dialog::Mine(corner));
        } else if let Some(corner) = hit(&self.green) {
            self.open(Dialog::Held(corner));
        }
    }
}

fn marker_box(corner: Point) -> BoundingBox {
    BoundingBox::new(corner.x as u32, corner.y as u32, MARKER_SIZE, MARKER_SIZE)
}

fn fill(frame: &mut RgbaImage, b: BoundingBox, px: Rgba<u8>) {
    for y in b.y..b.y + b.height {
        for x in b.x..b.x + b.width {
            frame.put_pixel(x, y, px);
        }
    }
}

pub type SharedBoard = Rc<RefCell<Board>>;

pub struct SimScreen(pub SharedBoard);

impl FrameSource for SimScreen {
    fn capture_frame(&mut self) -> Result<RgbaImage> {
        Ok(self.0.borrow().render())
    }
}

pub struct SimPointer(pub SharedBoard);

impl Pointer for SimPointer {
    fn click(&mut self, at: Point) -> Result<()> {
        self.0.borrow_mut().click(at);
        Ok(())
    }
}

/// Virtual time: `sleep` advances it instantly.
pub struct SimClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

/// A board with the given red marker corners, plus the capabilities that
/// drive it.
pub fn board(red: &[Point]) -> (SharedBoard, SimScreen, SimPointer, SimClock) {
    let elapsed = Rc::new(Cell::new(Duration::ZERO));
    let board = Rc::new(RefCell::new(Board {
        red: red.to_vec(),
        green: Vec::new(),
        resolutions: VecDeque::new(),
        batches: VecDeque::new(),
        search_visible: true,
        dialogs_open: true,
        button_delay: Duration::ZERO,
        field_visible: true,
        clicks: Vec::new(),
        returned: 0,
        searches: 0,
        dialog: Dialog::Closed,
        dialog_since: Duration::ZERO,
        elapsed: elapsed.clone(),
    }));
    let clock = SimClock {
        origin: Instant::now(),
        elapsed,
    };
    (
        board.clone(),
        SimScreen(board.clone()),
        SimPointer(board),
        clock,
    )
}
