mod common;
mod editing;
mod scenarios;
mod scheduling;
mod structure;
mod watch;
