mod flex_map;
mod value;

pub use flex_map::FlexMap;
pub use value::Value;
