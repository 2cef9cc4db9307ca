mod actions;
mod cli;
mod config;
mod debounce;
mod dispatch;
mod engine;
mod gestures;
mod logging;
mod pipeline;
mod smoothing;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
