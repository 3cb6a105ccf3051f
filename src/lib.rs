pub mod classify;
pub mod output;
pub mod parser;
pub mod record;
pub mod rules;
pub mod stats;
