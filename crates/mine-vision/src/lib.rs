pub mod blobs;
pub mod buttons;
pub mod hsv;
pub mod mask;
pub mod markers;
pub mod play_area;

pub use buttons::{find_button, ButtonColor};
pub use hsv::{ColorSpec, HsvRange, HueBand};
pub use markers::{detect_markers, survey, Marker, MarkerColor, Survey};
pub use play_area::{derive_work_area, dialog_window, locate_play_area, search_bar_window};
