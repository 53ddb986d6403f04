mod app;
mod logging;
mod widgets;

pub use app::run_app;
