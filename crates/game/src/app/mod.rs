pub(crate) mod bootstrap;
pub(crate) mod config;
pub(crate) mod default_bank;
pub(crate) mod loop_runner;
pub(crate) mod score;
pub(crate) mod simulation;
pub(crate) mod world;
