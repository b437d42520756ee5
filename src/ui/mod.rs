pub mod grid;
pub mod input;
pub mod mapper;
pub mod visualizer;

pub use grid::TerminalGrid;
pub use input::KeyWatcher;
pub use visualizer::Visualizer;
