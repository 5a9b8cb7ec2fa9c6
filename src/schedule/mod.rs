use pest_derive::Parser;

mod day_schedule;
mod parser;

pub use day_schedule::{DaySchedule, Interval};
pub use parser::parse_schedule;

#[derive(Parser)]
#[grammar = "schedule/schedule.pest"]
pub struct ScheduleParser;
