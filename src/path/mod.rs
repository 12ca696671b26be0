mod flex_path;

pub use flex_path::FlexPath;
