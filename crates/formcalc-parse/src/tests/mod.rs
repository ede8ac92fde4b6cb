mod deps;
mod parser;
