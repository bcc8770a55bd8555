mod string;

pub use string::{diff_format, grey_format, strip_carriage_returns};
