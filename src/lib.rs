pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dom;
pub mod fetcher;
pub mod form;
pub mod history;
pub mod model;
pub mod output;
pub mod page;
pub mod renderer;

#[cfg(test)]
mod tests;
