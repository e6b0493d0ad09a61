pub const MAX_FUNC_ARGS: usize = 255;

pub const NOTHING_STR: &str = "nothing";
