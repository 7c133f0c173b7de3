pub mod datetime;
pub mod test_utils;

pub use datetime::{
    combine_date_time, format_date_for_api, format_date_time_for_api, normalize_time_format,
    parse_date_time, parse_time, DateInput, DateTimeError,
};
